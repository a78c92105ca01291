//! Core data types for the macro-charts system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A numeric series aligned to a category axis; `None` is a gap.
pub type Values = Vec<Option<f64>>;

/// A single field value in a raw source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value.
    Number(f64),
    /// Text value (dates, labels, numbers delivered as strings).
    Text(String),
    /// Boolean flag. Never a usable key or metric.
    Bool(bool),
    /// Explicit null.
    Null,
}

impl FieldValue {
    /// Whether the value is an explicit null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Coerce to a non-empty string suitable for a period key.
    pub fn as_key_string(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            FieldValue::Number(n) if n.is_finite() => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Parse as a finite float.
    ///
    /// Returns `None` for nulls, booleans, non-numeric text and non-finite
    /// numbers. Never substitutes zero.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Bool(_) | FieldValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }
}

/// Render integral numbers without a fractional part (`20200131`, not `20200131.0`).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A raw record from one source: field name to value.
///
/// Field names differ between sources; see [`crate::config::FieldConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, FieldValue>);

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Set a field, returning the record for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Set a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Granularity of a period key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// Calendar day, `YYYY-MM-DD`.
    Day,
    /// Calendar month, `YYYY-MM`.
    Month,
    /// Anything else (e.g. a quarter label). Sortable, not date-comparable.
    Other,
}

/// Canonical sortable period key.
///
/// Day and month keys use fixed-width zero-padded components, so string order
/// equals chronological order within one granularity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Wrap a string verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key from a raw source string, rewriting day and month forms
    /// (`20200131`, `2020/1/31`, `2020-01-31 15:00:00`, `2020/01`) to
    /// `YYYY-MM-DD` / `YYYY-MM`. Other strings are kept as-is (trimmed).
    pub fn canonical(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self(canonicalize(trimmed).unwrap_or_else(|| trimmed.to_string()))
    }

    /// Key for a calendar month.
    pub fn from_year_month(year: i32, month: u32) -> Self {
        Self(format!("{:04}-{:02}", year, month))
    }

    /// Borrow the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Detect the key's granularity.
    pub fn granularity(&self) -> Granularity {
        let b = self.0.as_bytes();
        let digits = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);
        match b.len() {
            10 if digits(0..4) && b[4] == b'-' && digits(5..7) && b[7] == b'-' && digits(8..10) => {
                Granularity::Day
            }
            7 if digits(0..4) && b[4] == b'-' && digits(5..7) => Granularity::Month,
            _ => Granularity::Other,
        }
    }

    /// Calendar date of the key. Month keys resolve to the first of the month.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self.granularity() {
            Granularity::Day => NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok(),
            Granularity::Month => NaiveDate::parse_from_str(&format!("{}-01", self.0), "%Y-%m-%d").ok(),
            Granularity::Other => None,
        }
    }

    /// Whether this key falls inside the given month key (prefix match).
    pub fn is_in_month(&self, month: &PeriodKey) -> bool {
        self.granularity() == Granularity::Day && self.0.starts_with(month.as_str())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodKey {
    fn from(s: &str) -> Self {
        Self::canonical(s)
    }
}

fn canonicalize(s: &str) -> Option<String> {
    // Drop a time-of-day suffix.
    let date_part = s.split(|c: char| c == ' ' || c == 'T').next()?;

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        let (y, rest) = date_part.split_at(4);
        let (m, d) = rest.split_at(2);
        return valid_day(y, m, d);
    }

    let parts: Vec<&str> = date_part.split(|c: char| c == '-' || c == '/' || c == '.').collect();
    match parts.as_slice() {
        [y, m, d] => valid_day(y, m, d),
        [y, m] => {
            let year = parse_year(y)?;
            let month = parse_component(m, 1, 12)?;
            Some(format!("{:04}-{:02}", year, month))
        }
        _ => None,
    }
}

fn valid_day(y: &str, m: &str, d: &str) -> Option<String> {
    let year = parse_year(y)?;
    let month = parse_component(m, 1, 12)?;
    let day = parse_component(d, 1, 31)?;
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_component(s: &str, min: u32, max: u32) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let v: u32 = s.parse().ok()?;
    (min..=max).contains(&v).then_some(v)
}

/// Several metric arrays sharing one category axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    /// Category axis.
    pub categories: Vec<PeriodKey>,
    /// Metric arrays, each `categories.len()` long.
    pub series: BTreeMap<String, Values>,
}

impl AlignedSeries {
    /// An axis with no categories and no series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the axis is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Borrow a metric array.
    pub fn get(&self, name: &str) -> Option<&Values> {
        self.series.get(name)
    }
}

/// Mean and population standard deviation of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl StatSummary {
    /// `mean + k * std`.
    #[inline]
    pub fn band(&self, k: f64) -> f64 {
        self.mean + k * self.std
    }
}

/// Qualitative valuation label. "Low" means cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Above mean + 2σ.
    ExtremelyLow,
    /// Above mean + 1σ.
    Low,
    /// Above the mean.
    MidLow,
    /// Above mean - 1σ.
    MidHigh,
    /// Above mean - 2σ.
    High,
    /// At or below mean - 2σ.
    ExtremelyHigh,
    /// No value, or no summary with a usable spread.
    Unavailable,
}

impl Label {
    /// Ordinal from cheapest (0) to most expensive (5).
    pub fn bucket_index(self) -> Option<u8> {
        match self {
            Label::ExtremelyLow => Some(0),
            Label::Low => Some(1),
            Label::MidLow => Some(2),
            Label::MidHigh => Some(3),
            Label::High => Some(4),
            Label::ExtremelyHigh => Some(5),
            Label::Unavailable => None,
        }
    }
}

/// Value-axis range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}
