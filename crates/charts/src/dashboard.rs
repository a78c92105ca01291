//! One render pass: every chart that the supplied sources can feed.

use chrono::NaiveDate;
use macro_core::{Config, PeriodKey, RawRecord, Result};
use macro_features::buffett::market_cap_to_gdp;
use macro_features::{PremiumCalculator, PremiumMode, PremiumSeries};
use macro_ingestion::DailySeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::bundle::ChartBundle;
use crate::views::{
    cpi_ppi_chart, margin_chart, money_supply_chart, points_from_records, premium_chart,
    valuation_chart, ChartKind,
};

/// Raw records per source, as delivered by the fetching layer.
///
/// Missing sources deserialize as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    /// Daily index prices and P/E.
    pub index: Vec<RawRecord>,
    /// Daily 10-year government bond yields.
    pub bond_yield: Vec<RawRecord>,
    /// Precomputed market cap / GDP by quarter label.
    pub valuation: Vec<RawRecord>,
    /// Cumulative year-to-date GDP.
    pub gdp: Vec<RawRecord>,
    /// Monthly exchange market capitalization.
    pub market_cap: Vec<RawRecord>,
    /// Monthly CPI.
    pub cpi: Vec<RawRecord>,
    /// Monthly PPI.
    pub ppi: Vec<RawRecord>,
    /// Monthly M1/M2 growth.
    pub money_supply: Vec<RawRecord>,
    /// Daily margin account balances.
    pub margin: Vec<RawRecord>,
}

impl Sources {
    /// Parse sources from a JSON object keyed by source name.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Charts built in one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub charts: BTreeMap<ChartKind, ChartBundle>,
}

impl Dashboard {
    /// A chart, if its inputs were available.
    pub fn get(&self, kind: ChartKind) -> Option<&ChartBundle> {
        self.charts.get(&kind)
    }

    /// Number of charts built.
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    /// Whether no chart could be built.
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

/// Market cap / GDP points: the precomputed series when supplied, else derived
/// from GDP and market cap.
pub fn valuation_points(sources: &Sources, config: &Config) -> Vec<(PeriodKey, Option<f64>)> {
    if sources.valuation.is_empty() {
        market_cap_to_gdp(&sources.gdp, &sources.market_cap, &config.fields)
    } else {
        points_from_records(
            &sources.valuation,
            &config.fields.valuation_key,
            &config.fields.valuation_ratio,
        )
    }
}

/// Premium series from the index and bond sources.
pub fn premium_series(sources: &Sources, config: &Config) -> PremiumSeries {
    PremiumCalculator::new(&config.fields, &config.premium).compute(&sources.index, &sources.bond_yield)
}

fn index_daily(records: &[RawRecord], config: &Config) -> DailySeries {
    DailySeries::from_records(records, &config.fields.index_key, &config.fields.index_close)
}

/// Sources plus the derived series several charts share, computed once.
struct ChartInputs<'a> {
    sources: &'a Sources,
    config: &'a Config,
    premium: PremiumSeries,
    daily: DailySeries,
}

impl<'a> ChartInputs<'a> {
    fn new(sources: &'a Sources, config: &'a Config) -> Self {
        Self {
            sources,
            config,
            premium: premium_series(sources, config),
            daily: index_daily(&sources.index, config),
        }
    }

    fn build(&self, kind: ChartKind, as_of: NaiveDate) -> Result<Option<ChartBundle>> {
        let (sources, config) = (self.sources, self.config);
        match kind {
            ChartKind::Valuation => valuation_chart(&valuation_points(sources, config), &self.daily),
            ChartKind::FedPremium => {
                premium_chart(PremiumMode::Ratio, &self.premium, &sources.index, config, as_of)
            }
            ChartKind::RiskPremium => {
                premium_chart(PremiumMode::Difference, &self.premium, &sources.index, config, as_of)
            }
            ChartKind::CpiPpi => cpi_ppi_chart(&sources.cpi, &sources.ppi, config),
            ChartKind::MoneySupply => money_supply_chart(&sources.money_supply, config),
            ChartKind::Margin => margin_chart(&sources.margin, &sources.index, config),
        }
    }
}

/// Build one chart. `Ok(None)` when its inputs are empty.
pub fn build_chart(
    kind: ChartKind,
    sources: &Sources,
    config: &Config,
    as_of: NaiveDate,
) -> Result<Option<ChartBundle>> {
    ChartInputs::new(sources, config).build(kind, as_of)
}

/// Build every chart the sources can feed. Charts without inputs are left out;
/// a chart that fails to assemble is logged and left out.
pub fn build_dashboard(sources: &Sources, config: &Config, as_of: NaiveDate) -> Dashboard {
    let inputs = ChartInputs::new(sources, config);

    let mut charts = BTreeMap::new();
    for kind in ChartKind::ALL {
        match inputs.build(kind, as_of) {
            Ok(Some(bundle)) => {
                charts.insert(kind, bundle);
            }
            Ok(None) => debug!(chart = kind.name(), "chart skipped: no input"),
            Err(e) => warn!(chart = kind.name(), error = %e, "chart skipped"),
        }
    }

    Dashboard { charts }
}
