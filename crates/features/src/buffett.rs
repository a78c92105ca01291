//! Total market capitalization to GDP.
//!
//! GDP is published as cumulative year-to-date figures (`第1季度`, `第1-2季度`,
//! ...). These are de-cumulated into single quarters and divided into the
//! combined exchange market cap at the end of each quarter.

use macro_core::config::FieldConfig;
use macro_core::{FieldCandidates, PeriodKey, RawRecord};
use macro_ingestion::period::{month_key_of, parse_quarter_coverage, quarter_end_month, quarter_label};
use macro_ingestion::{extract_value, has_field, normalize_key};
use std::collections::BTreeMap;

/// Single-quarter GDP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterlyGdp {
    pub year: i32,
    pub quarter: u8,
    pub value: f64,
}

/// Present value, zero when no candidate field exists at all, `None` when a
/// field exists but is not a finite number.
fn value_or_zero(record: &RawRecord, candidates: &FieldCandidates) -> Option<f64> {
    if !has_field(record, candidates) {
        return Some(0.0);
    }
    extract_value(record, candidates)
}

/// Combined Shanghai + Shenzhen market cap per month. Later records win.
pub fn market_cap_by_month(records: &[RawRecord], fields: &FieldConfig) -> BTreeMap<PeriodKey, f64> {
    records
        .iter()
        .filter_map(|r| {
            let month = month_key_of(normalize_key(r, &fields.market_cap_key)?.as_str())?;
            let sh = value_or_zero(r, &fields.market_cap_shanghai)?;
            let sz = value_or_zero(r, &fields.market_cap_shenzhen)?;
            Some((month, sh + sz))
        })
        .collect()
}

/// Market cap for a month, else the latest earlier month of the same year.
pub fn cap_for_month(caps: &BTreeMap<PeriodKey, f64>, month: &PeriodKey) -> Option<f64> {
    let year = month.as_str().get(..4)?;
    let year_start = PeriodKey::new(format!("{}-01", year));
    if *month < year_start {
        return None;
    }
    caps.range(year_start..=month.clone())
        .next_back()
        .map(|(_, cap)| *cap)
}

/// De-cumulate year-to-date GDP into single quarters, in (year, quarter) order.
///
/// A quarter needs both its own and the previous cumulative figure; quarters
/// that come out non-positive are dropped.
pub fn quarterly_gdp(records: &[RawRecord], fields: &FieldConfig) -> Vec<QuarterlyGdp> {
    let mut cumulative: BTreeMap<i32, BTreeMap<u8, f64>> = BTreeMap::new();
    for record in records {
        let Some(label) = normalize_key(record, &fields.gdp_label) else {
            continue;
        };
        let Some(coverage) = parse_quarter_coverage(label.as_str()) else {
            continue;
        };
        let Some(value) = value_or_zero(record, &fields.gdp_value) else {
            continue;
        };
        cumulative
            .entry(coverage.year)
            .or_default()
            .insert(coverage.through_quarter, value);
    }

    let mut out = Vec::new();
    for (year, cum) in &cumulative {
        for quarter in 1..=4u8 {
            let value = if quarter == 1 {
                cum.get(&1).copied()
            } else {
                match (cum.get(&quarter), cum.get(&(quarter - 1))) {
                    (Some(this), Some(prev)) => Some(this - prev),
                    _ => None,
                }
            };
            if let Some(value) = value.filter(|v| v.is_finite() && *v > 0.0) {
                out.push(QuarterlyGdp {
                    year: *year,
                    quarter,
                    value,
                });
            }
        }
    }
    out
}

/// Market cap to quarterly GDP ratio, labelled `"{year}年第{q}季度"`.
pub fn market_cap_to_gdp(
    gdp_records: &[RawRecord],
    market_cap_records: &[RawRecord],
    fields: &FieldConfig,
) -> Vec<(PeriodKey, Option<f64>)> {
    let caps = market_cap_by_month(market_cap_records, fields);
    quarterly_gdp(gdp_records, fields)
        .into_iter()
        .filter_map(|q| {
            let month = PeriodKey::from_year_month(q.year, quarter_end_month(q.quarter)?);
            let cap = cap_for_month(&caps, &month)?;
            let ratio = cap / q.value;
            ratio
                .is_finite()
                .then(|| (PeriodKey::new(quarter_label(q.year, q.quarter)), Some(ratio)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gdp(label: &str, value: f64) -> RawRecord {
        RawRecord::new().with("quarter", label).with("gdp_abs", value)
    }

    fn cap(date: &str, sh: f64, sz: f64) -> RawRecord {
        RawRecord::new()
            .with("date", date)
            .with("market_cap_shanghai", sh)
            .with("market_cap_shenzhen", sz)
    }

    #[test]
    fn test_decumulate() {
        let fields = FieldConfig::default();
        let records = [
            gdp("2020年第1-3季度", 720.0),
            gdp("2020年第1季度", 200.0),
            gdp("2020年第1-2季度", 450.0),
            gdp("2020年第1-四季度", 1000.0),
            gdp("2021年第1-2季度", 500.0),
        ];
        let quarters = quarterly_gdp(&records, &fields);
        let values: Vec<(i32, u8, f64)> = quarters.iter().map(|q| (q.year, q.quarter, q.value)).collect();
        assert_eq!(
            values,
            vec![(2020, 1, 200.0), (2020, 2, 250.0), (2020, 3, 270.0), (2020, 4, 280.0)]
        );
    }

    #[test]
    fn test_non_positive_quarter_dropped() {
        let fields = FieldConfig::default();
        let records = [gdp("2020年第1季度", 300.0), gdp("2020年第1-2季度", 250.0)];
        let quarters = quarterly_gdp(&records, &fields);
        assert_eq!(quarters.len(), 1);
        assert_eq!(quarters[0].quarter, 1);
    }

    #[test]
    fn test_cap_lookup_same_year_only() {
        let fields = FieldConfig::default();
        let caps = market_cap_by_month(
            &[cap("2019-12", 50.0, 50.0), cap("2020年2月", 30.0, 40.0)],
            &fields,
        );
        assert_eq!(cap_for_month(&caps, &PeriodKey::new("2020-03")), Some(70.0));
        assert_eq!(cap_for_month(&caps, &PeriodKey::new("2019-12")), Some(100.0));
        assert_eq!(cap_for_month(&caps, &PeriodKey::new("2020-01")), None);
    }

    #[test]
    fn test_missing_exchange_counts_as_zero() {
        let fields = FieldConfig::default();
        let records = [
            RawRecord::new().with("date", "2020-03").with("market_cap_shanghai", 10.0),
            RawRecord::new()
                .with("date", "2020-04")
                .with("market_cap_shanghai", 10.0)
                .with("market_cap_shenzhen", "--"),
        ];
        let caps = market_cap_by_month(&records, &fields);
        assert_eq!(caps.get(&PeriodKey::new("2020-03")), Some(&10.0));
        assert!(caps.get(&PeriodKey::new("2020-04")).is_none());
    }

    #[test]
    fn test_ratio() {
        let fields = FieldConfig::default();
        let ratios = market_cap_to_gdp(
            &[gdp("2020年第1季度", 200.0), gdp("2020年第1-2季度", 450.0)],
            &[cap("2020-03-31", 100.0, 60.0), cap("2020-05-29", 150.0, 100.0)],
            &fields,
        );
        assert_eq!(ratios.len(), 2);
        assert_eq!(ratios[0].0, PeriodKey::new("2020年第1季度"));
        assert_relative_eq!(ratios[0].1.unwrap(), 0.8);
        // Q2 has no June figure and falls back to May.
        assert_eq!(ratios[1].0, PeriodKey::new("2020年第2季度"));
        assert_relative_eq!(ratios[1].1.unwrap(), 1.0);
    }
}
