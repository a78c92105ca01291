//! Multi-series alignment onto a common category axis.
//!
//! Every input series is normalized to `(key, value)` points, the axis is built
//! either from the union of all keys or from one designated primary series, and
//! each series is resampled onto the axis with explicit gaps.

use chrono::{Months, NaiveDate};
use macro_core::{AlignedSeries, FieldCandidates, PeriodKey, RawRecord, Values};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::normalizer::{extract_value, has_field, normalize_key, Normalizer};

/// One named source series to align.
#[derive(Debug, Clone, Copy)]
pub struct SeriesInput<'a> {
    /// Output series name.
    pub name: &'a str,
    /// Raw records of the source.
    pub records: &'a [RawRecord],
    /// Candidate fields for the period key.
    pub key_fields: &'a FieldCandidates,
    /// Candidate fields for the value.
    pub value_fields: &'a FieldCandidates,
}

impl<'a> SeriesInput<'a> {
    /// Create a series input.
    pub fn new(
        name: &'a str,
        records: &'a [RawRecord],
        key_fields: &'a FieldCandidates,
        value_fields: &'a FieldCandidates,
    ) -> Self {
        Self {
            name,
            records,
            key_fields,
            value_fields,
        }
    }
}

/// Keep only keys on or after `as_of` minus a number of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    /// Window length in years.
    pub years: u32,
    /// Reference date, supplied by the caller.
    pub as_of: NaiveDate,
}

impl RecencyWindow {
    /// Create a window ending at `as_of`.
    pub fn new(years: u32, as_of: NaiveDate) -> Self {
        Self { years, as_of }
    }

    /// First date inside the window.
    pub fn start(&self) -> NaiveDate {
        self.as_of
            .checked_sub_months(Months::new(self.years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Whether a key falls inside the window. Keys that are not a day or month
    /// are outside.
    pub fn contains(&self, key: &PeriodKey) -> bool {
        key.to_date().is_some_and(|date| date >= self.start())
    }
}

/// Alignment options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignOptions<'a> {
    /// Series whose keys alone form the axis.
    pub primary: Option<&'a str>,
    /// Recency filter applied to the axis.
    pub window: Option<RecencyWindow>,
}

impl<'a> AlignOptions<'a> {
    /// Axis from the union of all series.
    pub fn union() -> Self {
        Self::default()
    }

    /// Axis from one primary series.
    pub fn primary(name: &'a str) -> Self {
        Self {
            primary: Some(name),
            window: None,
        }
    }

    /// Add a recency window.
    pub fn with_window(mut self, window: RecencyWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// Key to value lookup with last-write-wins on duplicate keys.
pub fn build_lookup(points: impl IntoIterator<Item = (PeriodKey, Option<f64>)>) -> HashMap<PeriodKey, Option<f64>> {
    points.into_iter().collect()
}

/// Resample points onto an axis; keys absent from the points become gaps.
pub fn resample(points: &[(PeriodKey, Option<f64>)], axis: &[PeriodKey]) -> Values {
    let lookup = build_lookup(points.iter().cloned());
    fill(&lookup, axis)
}

fn fill(lookup: &HashMap<PeriodKey, Option<f64>>, axis: &[PeriodKey]) -> Values {
    axis.iter()
        .map(|key| lookup.get(key).copied().flatten())
        .collect()
}

/// Values a source reported itself, placed on an axis.
///
/// `None` where no keyed record carries any of `value_fields`; `Some(None)`
/// where the field is present but null or unparsable. Later records win.
pub fn reported_on_axis(
    records: &[RawRecord],
    key_fields: &FieldCandidates,
    value_fields: &FieldCandidates,
    axis: &[PeriodKey],
) -> Vec<Option<Option<f64>>> {
    let reported: HashMap<PeriodKey, Option<f64>> = records
        .iter()
        .filter(|r| has_field(r, value_fields))
        .filter_map(|r| Some((normalize_key(r, key_fields)?, extract_value(r, value_fields))))
        .collect();
    axis.iter().map(|key| reported.get(key).copied()).collect()
}

/// Align several series onto one sorted category axis.
///
/// Series with no keyed records are left out of the result. If a primary
/// series is designated but has no keys (or none inside the window), the
/// result is empty.
pub fn align(inputs: &[SeriesInput<'_>], options: &AlignOptions<'_>) -> AlignedSeries {
    let lookups: Vec<(&str, HashMap<PeriodKey, Option<f64>>)> = inputs
        .iter()
        .filter_map(|input| {
            let mut normalizer = Normalizer::new(input.key_fields, input.value_fields);
            let points = normalizer.normalize_all(input.records);
            if points.is_empty() {
                debug!(series = input.name, "omitting series with no keyed records");
                return None;
            }
            Some((input.name, build_lookup(points)))
        })
        .collect();

    let keys: BTreeSet<&PeriodKey> = match options.primary {
        Some(primary) => match lookups.iter().find(|(name, _)| *name == primary) {
            Some((_, lookup)) => lookup.keys().collect(),
            None => {
                debug!(series = primary, "primary series empty; returning empty axis");
                return AlignedSeries::empty();
            }
        },
        None => lookups.iter().flat_map(|(_, lookup)| lookup.keys()).collect(),
    };

    let categories: Vec<PeriodKey> = keys
        .into_iter()
        .filter(|key| options.window.map_or(true, |w| w.contains(key)))
        .cloned()
        .collect();

    if categories.is_empty() {
        return AlignedSeries::empty();
    }

    let series = lookups
        .iter()
        .map(|(name, lookup)| (name.to_string(), fill(lookup, &categories)))
        .collect();

    AlignedSeries { categories, series }
}
