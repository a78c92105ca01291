//! Valuation band classification.
//!
//! A premium value is bucketed against `mean ± {1, 2}σ` of its own history. A
//! high premium means equities are cheap relative to bonds, so the top bucket is
//! [`Label::ExtremelyLow`] valuation.

use macro_core::{Label, StatSummary};
use serde::{Deserialize, Serialize};

/// Classify a value against a summary.
///
/// Thresholds are checked from the top down with strict `>`, so a value lying
/// exactly on a threshold lands in the bucket nearer the mean. A summary with
/// zero or non-finite spread has no bands and classifies nothing.
pub fn classify(value: Option<f64>, stats: Option<&StatSummary>) -> Label {
    let (Some(v), Some(s)) = (value, stats) else {
        return Label::Unavailable;
    };
    if !s.std.is_finite() || s.std == 0.0 {
        return Label::Unavailable;
    }

    if v > s.band(2.0) {
        Label::ExtremelyLow
    } else if v > s.band(1.0) {
        Label::Low
    } else if v > s.mean {
        Label::MidLow
    } else if v > s.band(-1.0) {
        Label::MidHigh
    } else if v > s.band(-2.0) {
        Label::High
    } else {
        Label::ExtremelyHigh
    }
}

/// Classifier bound to one series and its precomputed summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandClassifier {
    series: String,
    stats: StatSummary,
}

impl BandClassifier {
    /// Bind a summary to the series it describes.
    pub fn new(series: impl Into<String>, stats: StatSummary) -> Self {
        Self {
            series: series.into(),
            stats,
        }
    }

    /// Name of the classified series.
    pub fn series(&self) -> &str {
        &self.series
    }

    /// The summary thresholds derive from.
    pub fn stats(&self) -> &StatSummary {
        &self.stats
    }

    /// Classify one value.
    #[inline]
    pub fn classify(&self, value: Option<f64>) -> Label {
        classify(value, Some(&self.stats))
    }

    /// Classify every point of a series.
    pub fn classify_all(&self, values: &[Option<f64>]) -> Vec<Label> {
        values.iter().map(|v| self.classify(*v)).collect()
    }
}
