//! Summary statistics and band overlays.

use macro_core::{StatSummary, Values};
use statrs::statistics::Statistics;

/// Standard deviation multiples drawn as band lines, top to bottom.
pub const BAND_LINES: [(&str, f64); 5] = [
    ("mean_plus_2sd", 2.0),
    ("mean_plus_1sd", 1.0),
    ("mean", 0.0),
    ("mean_minus_1sd", -1.0),
    ("mean_minus_2sd", -2.0),
];

/// Mean and population standard deviation over the present values.
///
/// Returns `None` when the series has no values, so no NaN reaches consumers.
pub fn summarize(values: &[Option<f64>]) -> Option<StatSummary> {
    summarize_iter(values.iter().flatten().copied())
}

/// Same as [`summarize`] over plain values.
pub fn summarize_iter(values: impl IntoIterator<Item = f64>) -> Option<StatSummary> {
    let present: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return None;
    }
    Some(StatSummary {
        mean: present.iter().mean(),
        std: present.iter().population_std_dev(),
    })
}

/// Constant band lines at `mean + k * std`, each `len` points long.
pub fn band_overlays(stats: &StatSummary, len: usize) -> Vec<(String, Values)> {
    BAND_LINES
        .iter()
        .map(|(name, k)| (name.to_string(), vec![Some(stats.band(*k)); len]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summarize_known() {
        let stats = summarize(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]).unwrap();
        assert_relative_eq!(stats.mean, 3.0);
        assert_relative_eq!(stats.std, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_skips_gaps() {
        let stats = summarize(&[None, Some(2.0), None, Some(4.0)]).unwrap();
        assert_relative_eq!(stats.mean, 3.0);
        assert_relative_eq!(stats.std, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_none());
        assert!(summarize(&[None, None]).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = summarize(&[Some(7.0)]).unwrap();
        assert_relative_eq!(stats.mean, 7.0);
        assert_relative_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_band_overlays() {
        let stats = StatSummary { mean: 1.0, std: 0.5 };
        let bands = band_overlays(&stats, 3);
        assert_eq!(bands.len(), 5);
        assert_eq!(bands[0].0, "mean_plus_2sd");
        assert_eq!(bands[0].1, vec![Some(2.0); 3]);
        assert_eq!(bands[2].1, vec![Some(1.0); 3]);
        assert_eq!(bands[4].1, vec![Some(0.0); 3]);
    }
}
