//! Key and value extraction from heterogeneous source records.
//!
//! Each logical field is resolved against an ordered list of candidate field
//! names. Records without a usable key are dropped; values that do not parse to
//! a finite number become gaps.

use macro_core::{FieldCandidates, PeriodKey, RawRecord};
use tracing::debug;

/// Resolve the period key of a record.
///
/// Returns the first candidate field that is present and non-empty, coerced to
/// a string and canonicalized. `None` means the record has no usable key.
pub fn normalize_key(record: &RawRecord, candidates: &FieldCandidates) -> Option<PeriodKey> {
    candidates
        .iter()
        .filter_map(|field| record.get(field))
        .find_map(|value| value.as_key_string())
        .map(|raw| PeriodKey::canonical(&raw))
}

/// Resolve a numeric value of a record.
///
/// The first candidate field that is present and not null decides the result;
/// later candidates are not consulted even if that value fails to parse.
pub fn extract_value(record: &RawRecord, candidates: &FieldCandidates) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|field| record.get(field))
        .find(|value| !value.is_null())
        .and_then(|value| value.as_f64())
}

/// Whether any candidate field is present in the record, null or not.
pub fn has_field(record: &RawRecord, candidates: &FieldCandidates) -> bool {
    candidates.iter().any(|field| record.get(field).is_some())
}

/// Statistics about normalization quality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Records seen.
    pub total_records: u64,
    /// Records dropped for lack of a key.
    pub missing_key: u64,
    /// Keyed records whose value was missing or not a finite number.
    pub unparsable_values: u64,
}

impl NormalizationStats {
    /// Records that made it into the output.
    pub fn kept(&self) -> u64 {
        self.total_records - self.missing_key
    }
}

/// Turns raw records of one source into `(key, value)` points.
pub struct Normalizer<'a> {
    key_fields: &'a FieldCandidates,
    value_fields: &'a FieldCandidates,
    stats: NormalizationStats,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for one key field and one value field.
    pub fn new(key_fields: &'a FieldCandidates, value_fields: &'a FieldCandidates) -> Self {
        Self {
            key_fields,
            value_fields,
            stats: NormalizationStats::default(),
        }
    }

    /// Normalize a single record.
    pub fn normalize(&mut self, record: &RawRecord) -> Option<(PeriodKey, Option<f64>)> {
        self.stats.total_records += 1;

        let Some(key) = normalize_key(record, self.key_fields) else {
            self.stats.missing_key += 1;
            debug!(fields = record.len(), "dropping record without a period key");
            return None;
        };

        let value = extract_value(record, self.value_fields);
        if value.is_none() {
            self.stats.unparsable_values += 1;
            debug!(key = %key, "value missing or not a finite number");
        }
        Some((key, value))
    }

    /// Normalize a batch of records, preserving input order.
    pub fn normalize_all(&mut self, records: &[RawRecord]) -> Vec<(PeriodKey, Option<f64>)> {
        records.iter().filter_map(|r| self.normalize(r)).collect()
    }

    /// Get normalization statistics.
    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_core::FieldValue;

    fn candidates(names: &[&str]) -> FieldCandidates {
        FieldCandidates::new(names.iter().copied())
    }

    #[test]
    fn test_key_priority() {
        let keys = candidates(&["tradeDate", "date"]);
        let rec = RawRecord::new()
            .with("date", "2020-01-02")
            .with("tradeDate", "2020-01-03");
        assert_eq!(normalize_key(&rec, &keys), Some(PeriodKey::new("2020-01-03")));
    }

    #[test]
    fn test_key_skips_empty() {
        let keys = candidates(&["month", "date"]);
        let rec = RawRecord::new().with("month", "").with("date", "2020-01");
        assert_eq!(normalize_key(&rec, &keys), Some(PeriodKey::new("2020-01")));

        let rec = RawRecord::new().with("month", FieldValue::Null);
        assert_eq!(normalize_key(&rec, &keys), None);
    }

    #[test]
    fn test_key_canonicalized() {
        let keys = candidates(&["date"]);
        let rec = RawRecord::new().with("date", 20200131i64);
        assert_eq!(normalize_key(&rec, &keys), Some(PeriodKey::new("2020-01-31")));
    }

    #[test]
    fn test_value_first_present_wins() {
        let values = candidates(&["ratio", "buffetRatio", "marketCapToGDP"]);
        let rec = RawRecord::new()
            .with("buffetRatio", "0.8")
            .with("marketCapToGDP", 0.9);
        assert_eq!(extract_value(&rec, &values), Some(0.8));

        // Null falls through, like `a ?? b`.
        let rec = RawRecord::new()
            .with("ratio", FieldValue::Null)
            .with("marketCapToGDP", 0.9);
        assert_eq!(extract_value(&rec, &values), Some(0.9));

        // Unparsable does not fall through.
        let rec = RawRecord::new()
            .with("ratio", "--")
            .with("marketCapToGDP", 0.9);
        assert_eq!(extract_value(&rec, &values), None);
    }

    #[test]
    fn test_has_field_counts_null() {
        let fields = candidates(&["m1m2YoY"]);
        assert!(has_field(&RawRecord::new().with("m1m2YoY", FieldValue::Null), &fields));
        assert!(!has_field(&RawRecord::new().with("m1YoY", 1.0), &fields));
    }

    #[test]
    fn test_value_never_zero_fill() {
        let values = candidates(&["close"]);
        assert_eq!(extract_value(&RawRecord::new(), &values), None);
        assert_eq!(extract_value(&RawRecord::new().with("close", "abc"), &values), None);
    }

    #[test]
    fn test_stats() {
        let keys = candidates(&["date"]);
        let values = candidates(&["close"]);
        let mut normalizer = Normalizer::new(&keys, &values);

        let records = vec![
            RawRecord::new().with("date", "2020-01-02").with("close", 1.0),
            RawRecord::new().with("close", 2.0),
            RawRecord::new().with("date", "2020-01-03").with("close", "x"),
        ];
        let points = normalizer.normalize_all(&records);

        assert_eq!(points.len(), 2);
        assert_eq!(points[1], (PeriodKey::new("2020-01-03"), None));
        let stats = normalizer.stats();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.missing_key, 1);
        assert_eq!(stats.unparsable_values, 1);
        assert_eq!(stats.kept(), 2);
    }
}
