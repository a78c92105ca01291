//! Period mapping between quarterly labels and daily series.
//!
//! Quarterly data is labelled in natural language (`2020年第1季度`, `2020Q1`).
//! To cross-reference it against a daily series, the quarter is mapped to the
//! month key of its final month and joined to the last available trading day
//! of that month.

use macro_core::{FieldCandidates, Granularity, PeriodKey, RawRecord};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::normalizer::Normalizer;

fn quarter_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4}).*?第([1-4一二三四])季度").expect("static regex"))
}

fn quarter_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\s*[-/]?\s*[Qq]([1-4])\b").expect("static regex"))
}

fn coverage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4}).*?第1(?:-([1-4一二三四]))?季度").expect("static regex"))
}

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\D*?(\d{1,2})").expect("static regex"))
}

fn quarter_ordinal(s: &str) -> Option<u8> {
    match s {
        "1" | "一" => Some(1),
        "2" | "二" => Some(2),
        "3" | "三" => Some(3),
        "4" | "四" => Some(4),
        _ => None,
    }
}

/// Last month of a quarter.
#[inline]
pub fn quarter_end_month(quarter: u8) -> Option<u32> {
    match quarter {
        1 => Some(3),
        2 => Some(6),
        3 => Some(9),
        4 => Some(12),
        _ => None,
    }
}

/// Parse year and quarter from a single-quarter label.
pub fn parse_quarter(label: &str) -> Option<(i32, u8)> {
    let caps = quarter_label_re()
        .captures(label)
        .or_else(|| quarter_code_re().captures(label))?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let quarter = quarter_ordinal(caps.get(2)?.as_str())?;
    Some((year, quarter))
}

/// Map a quarter label to the month key of the quarter's final month.
///
/// `"2020年第1季度"` becomes `"2020-03"`. Labels that do not name a single
/// quarter yield `None`.
pub fn quarter_to_month_key(label: &str) -> Option<PeriodKey> {
    let (year, quarter) = parse_quarter(label)?;
    Some(PeriodKey::from_year_month(year, quarter_end_month(quarter)?))
}

/// Canonical label for a quarter, in the form sources use.
pub fn quarter_label(year: i32, quarter: u8) -> String {
    format!("{}年第{}季度", year, quarter)
}

/// Year-to-date coverage of a cumulative quarterly label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterCoverage {
    pub year: i32,
    /// Last quarter included (1 for `第1季度`, 3 for `第1-3季度`).
    pub through_quarter: u8,
}

/// Parse a cumulative label such as `"2020年第1-3季度"`.
pub fn parse_quarter_coverage(label: &str) -> Option<QuarterCoverage> {
    let caps = coverage_re().captures(label)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let through_quarter = match caps.get(2) {
        Some(m) => quarter_ordinal(m.as_str())?,
        None => 1,
    };
    Some(QuarterCoverage {
        year,
        through_quarter,
    })
}

/// Extract a `YYYY-MM` key from a loosely formatted date (`"2020年3月"`, `"2020-3-31"`).
pub fn month_key_of(raw: &str) -> Option<PeriodKey> {
    let caps = year_month_re().captures(raw)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    (1..=12)
        .contains(&month)
        .then(|| PeriodKey::from_year_month(year, month))
}

/// Value of the chronologically latest day in `month_key` that has a value.
///
/// Days without a value never override an earlier trading day, so a calendar
/// month-end without trading resolves to the last trading day.
pub fn month_end_value(daily: &[(PeriodKey, Option<f64>)], month_key: &PeriodKey) -> Option<f64> {
    daily
        .iter()
        .filter(|(key, value)| value.is_some() && key.is_in_month(month_key))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .and_then(|(_, value)| *value)
}

/// A daily series ordered by day, for repeated month-end lookups.
#[derive(Debug, Clone, Default)]
pub struct DailySeries {
    points: BTreeMap<PeriodKey, f64>,
}

impl DailySeries {
    /// Build from raw records. Later records win on duplicate days, including
    /// a later record without a value, which leaves that day empty. Records
    /// without a day key are skipped.
    pub fn from_records(
        records: &[RawRecord],
        key_fields: &FieldCandidates,
        value_fields: &FieldCandidates,
    ) -> Self {
        let mut normalizer = Normalizer::new(key_fields, value_fields);
        let latest: BTreeMap<PeriodKey, Option<f64>> = normalizer
            .normalize_all(records)
            .into_iter()
            .filter(|(key, _)| key.granularity() == Granularity::Day)
            .collect();
        let points = latest
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        Self { points }
    }

    /// Value on the last available day of a month.
    pub fn month_end(&self, month_key: &PeriodKey) -> Option<f64> {
        let start = PeriodKey::new(format!("{}-00", month_key.as_str()));
        let end = PeriodKey::new(format!("{}-99", month_key.as_str()));
        self.points
            .range(start..=end)
            .next_back()
            .map(|(_, value)| *value)
    }

    /// Value on a specific day.
    pub fn get(&self, day: &PeriodKey) -> Option<f64> {
        self.points.get(day).copied()
    }

    /// Number of days with a value.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
