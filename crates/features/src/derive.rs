//! Point-wise derived series.

use macro_core::Values;
use serde::{Deserialize, Serialize};

/// Binary operation applied point-wise to two aligned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeriveOp {
    /// `a - b`.
    Difference,
    /// `a / b`.
    Ratio,
    /// `(a - b) * 100`.
    PercentDifference,
}

impl DeriveOp {
    /// Apply to two present values. Non-finite results (division by zero) are gaps.
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> Option<f64> {
        let result = match self {
            DeriveOp::Difference => a - b,
            DeriveOp::Ratio => a / b,
            DeriveOp::PercentDifference => (a - b) * 100.0,
        };
        result.is_finite().then_some(result)
    }
}

/// Derive a series from two aligned series.
///
/// The result at `i` is a gap unless both inputs have a value at `i`. A shorter
/// input is treated as gaps past its end.
pub fn derive(a: &[Option<f64>], b: &[Option<f64>], op: DeriveOp) -> Values {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| match (a.get(i).copied().flatten(), b.get(i).copied().flatten()) {
            (Some(x), Some(y)) => op.apply(x, y),
            _ => None,
        })
        .collect()
}

/// Per point, the reported value wherever the source reported one (even a
/// gap), else the derived value.
///
/// `reported[i]` is `None` when the source had no such field at `i`, and
/// `Some(None)` when the field was there but null or unparsable.
pub fn prefer_reported(reported: &[Option<Option<f64>>], derived: &[Option<f64>]) -> Values {
    let len = reported.len().max(derived.len());
    (0..len)
        .map(|i| match reported.get(i).copied().flatten() {
            Some(value) => value,
            None => derived.get(i).copied().flatten(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_difference() {
        let a = vec![Some(3.0), None, Some(1.0), Some(2.0)];
        let b = vec![Some(1.0), Some(2.0), None, Some(2.5)];
        assert_eq!(
            derive(&a, &b, DeriveOp::Difference),
            vec![Some(2.0), None, None, Some(-0.5)]
        );
    }

    #[test]
    fn test_null_propagation() {
        let a = vec![Some(1.0), None, Some(-4.0), None, Some(0.0)];
        let b = vec![None, Some(1.0), Some(2.0), None, Some(7.0)];
        for op in [DeriveOp::Difference, DeriveOp::PercentDifference, DeriveOp::Ratio] {
            let out = derive(&a, &b, op);
            assert_eq!(out.len(), a.len());
            for i in 0..a.len() {
                assert_eq!(out[i].is_none(), a[i].is_none() || b[i].is_none(), "op {:?} index {}", op, i);
            }
        }
    }

    #[test]
    fn test_ratio_and_percent() {
        let a = vec![Some(0.05)];
        let b = vec![Some(0.02)];
        assert_relative_eq!(derive(&a, &b, DeriveOp::Ratio)[0].unwrap(), 2.5);
        assert_relative_eq!(derive(&a, &b, DeriveOp::PercentDifference)[0].unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ratio_by_zero_is_gap() {
        assert_eq!(derive(&[Some(1.0)], &[Some(0.0)], DeriveOp::Ratio), vec![None]);
    }

    #[test]
    fn test_unequal_lengths() {
        let out = derive(&[Some(1.0), Some(2.0)], &[Some(1.0)], DeriveOp::Difference);
        assert_eq!(out, vec![Some(0.0), None]);
    }

    #[test]
    fn test_prefer_reported() {
        let reported = vec![Some(Some(1.0)), None, Some(None), None];
        let derived = vec![Some(9.0), Some(2.0), Some(3.0), None];
        assert_eq!(
            prefer_reported(&reported, &derived),
            vec![Some(1.0), Some(2.0), None, None]
        );
    }
}
