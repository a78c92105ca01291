//! Symmetric value-axis ranges.
//!
//! Two value axes sharing one chart line up their zero gridlines when each is
//! symmetric around zero.

use macro_core::config::AxisConfig;
use macro_core::AxisRange;
use ordered_float::OrderedFloat;

/// Largest absolute present value across arrays.
pub fn max_abs(arrays: &[&[Option<f64>]]) -> Option<f64> {
    arrays
        .iter()
        .flat_map(|values| values.iter().flatten())
        .filter(|v| v.is_finite())
        .map(|v| OrderedFloat(v.abs()))
        .max()
        .map(|v| v.into_inner())
}

/// `[-(max_abs + pad), max_abs + pad]` over the given arrays.
///
/// Falls back to `config.fallback_max_abs` when no array has a value.
pub fn symmetric_range(arrays: &[&[Option<f64>]], config: &AxisConfig) -> AxisRange {
    let half = max_abs(arrays).unwrap_or(config.fallback_max_abs) + config.padding;
    AxisRange {
        min: -half,
        max: half,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_abs() {
        let a = [Some(1.5), None, Some(-3.0)];
        let b = [Some(2.0)];
        assert_eq!(max_abs(&[&a, &b]), Some(3.0));
        assert_eq!(max_abs(&[&[None]]), None);
    }

    #[test]
    fn test_symmetric_range() {
        let config = AxisConfig::default();
        let left = [Some(-2.5), Some(1.0)];
        let range = symmetric_range(&[&left], &config);
        assert_eq!(range, AxisRange { min: -3.5, max: 3.5 });
    }

    #[test]
    fn test_fallback_range() {
        let config = AxisConfig::default();
        let range = symmetric_range(&[&[None, None]], &config);
        assert_eq!(range, AxisRange { min: -11.0, max: 11.0 });
        assert_eq!(symmetric_range(&[], &config), range);
    }

    #[test]
    fn test_independent_axes() {
        let config = AxisConfig::default();
        let left = symmetric_range(&[&[Some(8.0)], &[Some(-1.0)]], &config);
        let right = symmetric_range(&[&[Some(0.5)]], &config);
        assert_eq!(left.max, 9.0);
        assert_eq!(right.max, 1.5);
        assert_eq!(left.min + left.max, 0.0);
        assert_eq!(right.min + right.max, 0.0);
    }
}
