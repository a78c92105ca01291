//! Configuration structures for the macro-charts system.
//!
//! Field candidate lists are the only place where source-specific field names
//! live. Order matters: the first present field wins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordered list of field names for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCandidates(Vec<String>);

impl FieldCandidates {
    /// Build from field names in priority order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Iterate names in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn fields(names: &[&str]) -> FieldCandidates {
    FieldCandidates::new(names.iter().copied())
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Field names per source.
    pub fields: FieldConfig,
    /// Recency window and statistics scope.
    pub window: WindowConfig,
    /// Symmetric axis construction.
    pub axis: AxisConfig,
    /// Equity risk premium derivation.
    pub premium: PremiumConfig,
}

impl Config {
    /// Parse a (possibly partial) JSON configuration. Missing sections take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a chart.
    pub fn validate(&self) -> Result<()> {
        for (name, candidates) in self.fields.all() {
            if candidates.is_empty() {
                return Err(Error::config(format!("no field candidates for {}", name)));
            }
        }
        if self.window.recency_years == 0 {
            return Err(Error::config("recency_years must be positive"));
        }
        if !self.axis.padding.is_finite() || self.axis.padding < 0.0 {
            return Err(Error::config("axis padding must be a finite non-negative number"));
        }
        if !self.axis.fallback_max_abs.is_finite() || self.axis.fallback_max_abs <= 0.0 {
            return Err(Error::config("fallback_max_abs must be a finite positive number"));
        }
        if self.premium.bond_max_gap_days < 0 {
            return Err(Error::config("bond_max_gap_days must not be negative"));
        }
        Ok(())
    }
}

/// Field candidate lists, grouped by source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Daily index: day key for month-end joins.
    pub index_key: FieldCandidates,
    /// Daily index: day key when the index is the chart axis.
    pub index_axis_key: FieldCandidates,
    /// Daily index: close price.
    pub index_close: FieldCandidates,
    /// Daily index: price/earnings ratio.
    pub index_pe: FieldCandidates,
    /// Bond yield: day key.
    pub bond_key: FieldCandidates,
    /// Bond yield: 10-year yield in percent.
    pub bond_yield: FieldCandidates,
    /// Precomputed market-cap/GDP series: quarter label.
    pub valuation_key: FieldCandidates,
    /// Precomputed market-cap/GDP series: ratio.
    pub valuation_ratio: FieldCandidates,
    /// GDP: cumulative quarter label.
    pub gdp_label: FieldCandidates,
    /// GDP: cumulative absolute value.
    pub gdp_value: FieldCandidates,
    /// Market cap: month/date key.
    pub market_cap_key: FieldCandidates,
    /// Market cap: Shanghai exchange.
    pub market_cap_shanghai: FieldCandidates,
    /// Market cap: Shenzhen exchange.
    pub market_cap_shenzhen: FieldCandidates,
    /// CPI/PPI/money supply: month key.
    pub month_key: FieldCandidates,
    /// CPI year-over-year.
    pub cpi_yoy: FieldCandidates,
    /// PPI year-over-year.
    pub ppi_yoy: FieldCandidates,
    /// M1 year-over-year.
    pub m1_yoy: FieldCandidates,
    /// M2 year-over-year.
    pub m2_yoy: FieldCandidates,
    /// Precomputed M1-M2 difference.
    pub m1_m2_diff: FieldCandidates,
    /// Margin account: day key.
    pub margin_key: FieldCandidates,
    /// Margin account: financing balance.
    pub margin_financing: FieldCandidates,
    /// Margin account: securities lending balance.
    pub margin_lending: FieldCandidates,
}

impl FieldConfig {
    fn all(&self) -> [(&'static str, &FieldCandidates); 22] {
        [
            ("index_key", &self.index_key),
            ("index_axis_key", &self.index_axis_key),
            ("index_close", &self.index_close),
            ("index_pe", &self.index_pe),
            ("bond_key", &self.bond_key),
            ("bond_yield", &self.bond_yield),
            ("valuation_key", &self.valuation_key),
            ("valuation_ratio", &self.valuation_ratio),
            ("gdp_label", &self.gdp_label),
            ("gdp_value", &self.gdp_value),
            ("market_cap_key", &self.market_cap_key),
            ("market_cap_shanghai", &self.market_cap_shanghai),
            ("market_cap_shenzhen", &self.market_cap_shenzhen),
            ("month_key", &self.month_key),
            ("cpi_yoy", &self.cpi_yoy),
            ("ppi_yoy", &self.ppi_yoy),
            ("m1_yoy", &self.m1_yoy),
            ("m2_yoy", &self.m2_yoy),
            ("m1_m2_diff", &self.m1_m2_diff),
            ("margin_key", &self.margin_key),
            ("margin_financing", &self.margin_financing),
            ("margin_lending", &self.margin_lending),
        ]
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            index_key: fields(&["date", "tradeDate"]),
            index_axis_key: fields(&["tradeDate", "date"]),
            index_close: fields(&["close", "value"]),
            index_pe: fields(&["peg", "pe"]),
            bond_key: fields(&["date", "workTime", "tradeDate"]),
            bond_yield: fields(&["yield", "tenYear", "10年"]),
            valuation_key: fields(&["date"]),
            valuation_ratio: fields(&["ratio", "buffetRatio", "marketCapToGDP"]),
            gdp_label: fields(&["quarter"]),
            gdp_value: fields(&["gdp_abs"]),
            market_cap_key: fields(&["date"]),
            market_cap_shanghai: fields(&["market_cap_shanghai"]),
            market_cap_shenzhen: fields(&["market_cap_shenzhen"]),
            month_key: fields(&["month", "date", "tradeDate"]),
            cpi_yoy: fields(&["national_yoy", "yoy", "CPIYoY", "value"]),
            ppi_yoy: fields(&["yoy", "PPIYoY", "value"]),
            m1_yoy: fields(&["m1YoY", "M1YoY", "m1_yoy"]),
            m2_yoy: fields(&["m2YoY", "M2YoY", "m2_yoy"]),
            m1_m2_diff: fields(&["m1m2YoY"]),
            margin_key: fields(&["date", "tradeDate", "month"]),
            margin_financing: fields(&["fin_balance"]),
            margin_lending: fields(&["loan_balance"]),
        }
    }
}

/// Which points feed the mean/std behind bands and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsScope {
    /// Every computed point, including those outside the recency window.
    FullHistory,
    /// Only points visible on the chart axis.
    VisibleWindow,
}

/// Recency window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Years of daily history kept on index-driven axes.
    pub recency_years: u32,
    /// Statistics scope for band construction.
    pub stats_scope: StatsScope,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            recency_years: 10,
            stats_scope: StatsScope::FullHistory,
        }
    }
}

/// Symmetric axis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Margin added beyond the largest absolute value.
    pub padding: f64,
    /// Half-range used when an axis has no values.
    pub fallback_max_abs: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            padding: 1.0,
            fallback_max_abs: 10.0,
        }
    }
}

/// Equity risk premium configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PremiumConfig {
    /// Maximum age (days) of an earlier bond observation used for a missing day.
    pub bond_max_gap_days: i64,
    /// Decimal places kept on the earnings-yield/bond-yield ratio premium.
    pub ratio_decimals: u32,
    /// Decimal places kept on the earnings-yield minus bond-yield premium.
    pub diff_decimals: u32,
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            bond_max_gap_days: 5,
            ratio_decimals: 2,
            diff_decimals: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.recency_years, 10);
        assert_eq!(config.axis.padding, 1.0);
        assert_eq!(config.premium.bond_max_gap_days, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_candidate_order() {
        let config = Config::default();
        let names: Vec<&str> = config.fields.valuation_ratio.iter().collect();
        assert_eq!(names, vec!["ratio", "buffetRatio", "marketCapToGDP"]);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json_str(
            r#"{"window": {"recency_years": 5}, "fields": {"cpi_yoy": ["cpi"]}}"#,
        )
        .unwrap();
        assert_eq!(config.window.recency_years, 5);
        assert_eq!(config.window.stats_scope, StatsScope::FullHistory);
        assert_eq!(config.fields.cpi_yoy.iter().collect::<Vec<_>>(), vec!["cpi"]);
        assert_eq!(config.fields.ppi_yoy.len(), 3);
    }

    #[test]
    fn test_rejects_empty_candidates() {
        let err = Config::from_json_str(r#"{"fields": {"bond_yield": []}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_axis() {
        let mut config = Config::default();
        config.axis.fallback_max_abs = 0.0;
        assert!(config.validate().is_err());
    }
}
