//! Equity risk premium from index valuation and government bond yields.
//!
//! For each index day with a positive close and P/E, the earnings yield
//! `1 / pe` is compared to the 10-year bond yield of that day, or of the most
//! recent earlier bond observation within a few days.

use chrono::NaiveDate;
use macro_core::config::{FieldConfig, PremiumConfig};
use macro_core::{PeriodKey, RawRecord, StatSummary};
use macro_ingestion::{extract_value, normalize_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::stats::summarize_iter;

/// Which premium a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PremiumMode {
    /// Earnings yield over bond yield, minus one (Fed model).
    Ratio,
    /// Earnings yield minus bond yield.
    Difference,
}

/// One day of premium inputs and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumPoint {
    pub date: PeriodKey,
    pub close: f64,
    /// Bond yield in percent.
    pub bond_yield: f64,
    pub pe: f64,
    /// `ey / by - 1`, rounded.
    pub ratio: f64,
    /// `ey - by`, rounded.
    pub diff: f64,
}

/// Premium points in date order plus per-mode summaries over all points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PremiumSeries {
    pub points: Vec<PremiumPoint>,
    pub ratio_stats: Option<StatSummary>,
    pub diff_stats: Option<StatSummary>,
}

impl PremiumSeries {
    /// Whether no day produced a premium.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(date, premium)` pairs for one mode.
    pub fn values(&self, mode: PremiumMode) -> Vec<(PeriodKey, Option<f64>)> {
        self.points
            .iter()
            .map(|p| {
                let v = match mode {
                    PremiumMode::Ratio => p.ratio,
                    PremiumMode::Difference => p.diff,
                };
                (p.date.clone(), Some(v))
            })
            .collect()
    }

    /// Summary over every point for one mode.
    pub fn stats(&self, mode: PremiumMode) -> Option<StatSummary> {
        match mode {
            PremiumMode::Ratio => self.ratio_stats,
            PremiumMode::Difference => self.diff_stats,
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Computes premium series from raw index and bond records.
pub struct PremiumCalculator<'a> {
    fields: &'a FieldConfig,
    config: &'a PremiumConfig,
}

impl<'a> PremiumCalculator<'a> {
    /// Create a calculator.
    pub fn new(fields: &'a FieldConfig, config: &'a PremiumConfig) -> Self {
        Self { fields, config }
    }

    fn bond_yields(&self, bonds: &[RawRecord]) -> BTreeMap<NaiveDate, f64> {
        bonds
            .iter()
            .filter_map(|r| {
                let date = normalize_key(r, &self.fields.bond_key)?.to_date()?;
                let y = extract_value(r, &self.fields.bond_yield)?;
                Some((date, y))
            })
            .collect()
    }

    fn bond_yield_for(&self, yields: &BTreeMap<NaiveDate, f64>, date: NaiveDate) -> Option<f64> {
        let (found, y) = yields.range(..=date).next_back()?;
        ((date - *found).num_days() <= self.config.bond_max_gap_days).then_some(*y)
    }

    /// Compute both premium modes.
    pub fn compute(&self, index: &[RawRecord], bonds: &[RawRecord]) -> PremiumSeries {
        let yields = self.bond_yields(bonds);

        let mut days: BTreeMap<PeriodKey, (f64, f64)> = BTreeMap::new();
        for record in index {
            let Some(key) = normalize_key(record, &self.fields.index_key) else {
                continue;
            };
            let close = extract_value(record, &self.fields.index_close);
            let pe = extract_value(record, &self.fields.index_pe);
            if let (Some(close), Some(pe)) = (close, pe) {
                if close > 0.0 && pe > 0.0 {
                    days.insert(key, (close, pe));
                }
            }
        }

        let mut skipped = 0usize;
        let points: Vec<PremiumPoint> = days
            .into_iter()
            .filter_map(|(date, (close, pe))| {
                let by = date
                    .to_date()
                    .and_then(|d| self.bond_yield_for(&yields, d))
                    .filter(|by| *by > 0.0);
                let Some(by) = by else {
                    skipped += 1;
                    return None;
                };
                let ey = 1.0 / pe;
                let by_dec = by / 100.0;
                Some(PremiumPoint {
                    date,
                    close,
                    bond_yield: by,
                    pe,
                    ratio: round_to(ey / by_dec - 1.0, self.config.ratio_decimals),
                    diff: round_to(ey - by_dec, self.config.diff_decimals),
                })
            })
            .collect();

        if skipped > 0 {
            debug!(skipped, "index days without a usable bond yield");
        }

        PremiumSeries {
            ratio_stats: summarize_iter(points.iter().map(|p| p.ratio)),
            diff_stats: summarize_iter(points.iter().map(|p| p.diff)),
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn index_day(date: &str, close: f64, pe: f64) -> RawRecord {
        RawRecord::new().with("date", date).with("close", close).with("peg", pe)
    }

    fn bond_day(date: &str, y: f64) -> RawRecord {
        RawRecord::new().with("date", date).with("yield", y)
    }

    fn compute(index: &[RawRecord], bonds: &[RawRecord]) -> PremiumSeries {
        let fields = FieldConfig::default();
        let config = PremiumConfig::default();
        PremiumCalculator::new(&fields, &config).compute(index, bonds)
    }

    #[test]
    fn test_premium_values() {
        // pe 12.5 -> ey 0.08; bond 2.5% -> 0.025
        let series = compute(&[index_day("2020-01-02", 4000.0, 12.5)], &[bond_day("2020-01-02", 2.5)]);
        assert_eq!(series.points.len(), 1);
        let p = &series.points[0];
        assert_relative_eq!(p.ratio, 2.2); // 0.08 / 0.025 - 1
        assert_relative_eq!(p.diff, 0.055);
    }

    #[test]
    fn test_nearest_earlier_bond() {
        let index = [
            index_day("2020-01-06", 4000.0, 10.0),
            index_day("2020-01-20", 4000.0, 10.0),
        ];
        let bonds = [bond_day("2020-01-03", 3.0)];
        let series = compute(&index, &bonds);
        // 01-06 is 3 days after the bond print; 01-20 is too far.
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].date, PeriodKey::new("2020-01-06"));
        assert_relative_eq!(series.points[0].bond_yield, 3.0);
    }

    #[test]
    fn test_later_bond_not_used() {
        let series = compute(&[index_day("2020-01-02", 4000.0, 10.0)], &[bond_day("2020-01-03", 3.0)]);
        assert!(series.is_empty());
        assert!(series.stats(PremiumMode::Ratio).is_none());
    }

    #[test]
    fn test_invalid_inputs_skipped() {
        let index = [
            index_day("2020-01-02", 0.0, 10.0),
            index_day("2020-01-03", 4000.0, -5.0),
            RawRecord::new().with("date", "2020-01-06").with("close", 4000.0),
            index_day("2020-01-07", 4000.0, 10.0),
        ];
        let bonds = [bond_day("2020-01-03", 3.0), bond_day("2020-01-07", 0.0)];
        let series = compute(&index, &bonds);
        assert!(series.is_empty());
    }

    #[test]
    fn test_points_sorted_and_stats() {
        let index = [
            index_day("20200103", 4000.0, 10.0),
            index_day("2020-01-02", 4000.0, 20.0),
        ];
        let bonds = [bond_day("2020-01-02", 2.0), bond_day("2020-01-03", 2.0)];
        let series = compute(&index, &bonds);
        let dates: Vec<&str> = series.points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2020-01-02", "2020-01-03"]);

        // ratios: 0.05/0.02-1 = 1.5 and 0.1/0.02-1 = 4.0
        let stats = series.stats(PremiumMode::Ratio).unwrap();
        assert_relative_eq!(stats.mean, 2.75);
        assert_relative_eq!(stats.std, 1.25, epsilon = 1e-12);
        let values = series.values(PremiumMode::Difference);
        assert_relative_eq!(values[0].1.unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(1.23456, 2), 1.23);
        assert_relative_eq!(round_to(-0.00456, 4), -0.0046);
    }
}
