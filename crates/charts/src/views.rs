//! Per-chart pipelines: align, derive, summarize, classify, build.
//!
//! Each function is a pure transformation of one render pass' inputs. `Ok(None)`
//! means the chart's driving input is empty and there is nothing to draw.

use chrono::NaiveDate;
use macro_core::{Config, FieldCandidates, PeriodKey, RawRecord, Result, StatsScope, Values};
use macro_features::axis::symmetric_range;
use macro_features::stats::{band_overlays, summarize};
use macro_features::{derive, prefer_reported, BandClassifier, DeriveOp, PremiumMode, PremiumSeries};
use macro_ingestion::aligner::{align, reported_on_axis, resample, AlignOptions, RecencyWindow, SeriesInput};
use macro_ingestion::{quarter_to_month_key, DailySeries, Normalizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bundle::{BundleBuilder, ChartBundle};

/// The charts this system produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Market cap / GDP against the index.
    Valuation,
    /// Fed-model premium against the index.
    FedPremium,
    /// Earnings-yield minus bond-yield premium against the index.
    RiskPremium,
    /// CPI and PPI year-over-year with their difference.
    CpiPpi,
    /// M1 and M2 year-over-year with their difference.
    MoneySupply,
    /// Net margin balance against the index.
    Margin,
}

impl ChartKind {
    /// Every chart, in display order.
    pub const ALL: [ChartKind; 6] = [
        ChartKind::FedPremium,
        ChartKind::RiskPremium,
        ChartKind::Valuation,
        ChartKind::MoneySupply,
        ChartKind::CpiPpi,
        ChartKind::Margin,
    ];

    /// Stable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Valuation => "valuation",
            ChartKind::FedPremium => "fed_premium",
            ChartKind::RiskPremium => "risk_premium",
            ChartKind::CpiPpi => "cpi_ppi",
            ChartKind::MoneySupply => "money_supply",
            ChartKind::Margin => "margin",
        }
    }
}

fn finish(kind: ChartKind, builder: BundleBuilder) -> Option<ChartBundle> {
    let bundle = builder.build();
    info!(chart = kind.name(), points = bundle.len(), "chart bundle built");
    Some(bundle)
}

/// Normalize records to `(key, value)` points.
pub fn points_from_records(
    records: &[RawRecord],
    key_fields: &FieldCandidates,
    value_fields: &FieldCandidates,
) -> Vec<(PeriodKey, Option<f64>)> {
    Normalizer::new(key_fields, value_fields).normalize_all(records)
}

/// Market cap / GDP by quarter label, joined to the index close at the end of
/// each quarter's final month.
pub fn valuation_chart(
    ratio_points: &[(PeriodKey, Option<f64>)],
    index: &DailySeries,
) -> Result<Option<ChartBundle>> {
    let mut categories: Vec<PeriodKey> = ratio_points.iter().map(|(k, _)| k.clone()).collect();
    categories.sort();
    categories.dedup();
    if categories.is_empty() {
        debug!(chart = ChartKind::Valuation.name(), "no valuation points");
        return Ok(None);
    }

    let ratio = resample(ratio_points, &categories);
    let closes: Option<Values> = (!index.is_empty()).then(|| {
        categories
            .iter()
            .map(|label| quarter_to_month_key(label.as_str()).and_then(|m| index.month_end(&m)))
            .collect()
    });

    let mut builder = BundleBuilder::new(categories).series("ratio", ratio)?;
    if let Some(closes) = closes {
        builder = builder.series("index_close", closes)?;
    }

    Ok(finish(ChartKind::Valuation, builder))
}

/// Premium against the index over the recency window, with band lines and a
/// valuation classifier.
pub fn premium_chart(
    mode: PremiumMode,
    premium: &PremiumSeries,
    index: &[RawRecord],
    config: &Config,
    as_of: NaiveDate,
) -> Result<Option<ChartBundle>> {
    let kind = match mode {
        PremiumMode::Ratio => ChartKind::FedPremium,
        PremiumMode::Difference => ChartKind::RiskPremium,
    };
    if premium.is_empty() {
        debug!(chart = kind.name(), "no premium points");
        return Ok(None);
    }

    let fields = &config.fields;
    let window = RecencyWindow::new(config.window.recency_years, as_of);
    let aligned = align(
        &[
            SeriesInput::new("index_close", index, &fields.index_axis_key, &fields.index_close),
            SeriesInput::new("pe", index, &fields.index_axis_key, &fields.index_pe),
        ],
        &AlignOptions::primary("index_close").with_window(window),
    );
    if aligned.is_empty() {
        debug!(chart = kind.name(), "index empty inside the recency window");
        return Ok(None);
    }

    let values = resample(&premium.values(mode), &aligned.categories);
    let stats = match config.window.stats_scope {
        StatsScope::FullHistory => premium.stats(mode),
        StatsScope::VisibleWindow => summarize(&values),
    };

    let len = aligned.len();
    let mut builder = BundleBuilder::from_aligned(aligned)?.series("premium", values)?;
    if let Some(stats) = stats {
        for (name, line) in band_overlays(&stats, len) {
            builder = builder.overlay(name, line)?;
        }
        builder = builder.classifier(BandClassifier::new("premium", stats))?;
    }

    Ok(finish(kind, builder))
}

/// CPI and PPI on the union of their months, with `cpi - ppi` on a right axis.
pub fn cpi_ppi_chart(cpi: &[RawRecord], ppi: &[RawRecord], config: &Config) -> Result<Option<ChartBundle>> {
    let fields = &config.fields;
    let aligned = align(
        &[
            SeriesInput::new("cpi", cpi, &fields.month_key, &fields.cpi_yoy),
            SeriesInput::new("ppi", ppi, &fields.month_key, &fields.ppi_yoy),
        ],
        &AlignOptions::union(),
    );
    if aligned.is_empty() {
        debug!(chart = ChartKind::CpiPpi.name(), "no CPI or PPI points");
        return Ok(None);
    }

    let diff = match (aligned.get("cpi"), aligned.get("ppi")) {
        (Some(c), Some(p)) => Some(derive(c, p, DeriveOp::Difference)),
        _ => None,
    };
    let left = {
        let arrays: Vec<&[Option<f64>]> = aligned.series.values().map(Vec::as_slice).collect();
        symmetric_range(&arrays, &config.axis)
    };
    let right = symmetric_range(&[diff.as_deref().unwrap_or(&[])], &config.axis);

    let mut builder = BundleBuilder::from_aligned(aligned)?
        .axis("left", left)
        .axis("right", right);
    if let Some(diff) = diff {
        builder = builder.overlay("cpi_minus_ppi", diff)?;
    }

    Ok(finish(ChartKind::CpiPpi, builder))
}

/// M1 and M2 growth with their difference. Wherever a record carries the
/// reported difference field it wins, even when null; elsewhere the difference
/// is derived.
pub fn money_supply_chart(records: &[RawRecord], config: &Config) -> Result<Option<ChartBundle>> {
    let fields = &config.fields;
    let aligned = align(
        &[
            SeriesInput::new("m1", records, &fields.month_key, &fields.m1_yoy),
            SeriesInput::new("m2", records, &fields.month_key, &fields.m2_yoy),
        ],
        &AlignOptions::union(),
    );
    if aligned.is_empty() {
        debug!(chart = ChartKind::MoneySupply.name(), "no money supply points");
        return Ok(None);
    }

    let reported = reported_on_axis(records, &fields.month_key, &fields.m1_m2_diff, &aligned.categories);
    let derived = match (aligned.get("m1"), aligned.get("m2")) {
        (Some(m1), Some(m2)) => derive(m1, m2, DeriveOp::Difference),
        _ => Vec::new(),
    };
    let diff = prefer_reported(&reported, &derived);

    let mut builder = BundleBuilder::from_aligned(aligned)?;

    let left = {
        let m1 = builder.get_series("m1").map(Vec::as_slice).unwrap_or(&[]);
        let m2 = builder.get_series("m2").map(Vec::as_slice).unwrap_or(&[]);
        symmetric_range(&[m1, m2], &config.axis)
    };
    let right = symmetric_range(&[&diff], &config.axis);

    builder = builder.axis("left", left).axis("right", right);
    if diff.iter().any(Option::is_some) {
        builder = builder.overlay("m1_minus_m2", diff)?;
    }

    Ok(finish(ChartKind::MoneySupply, builder))
}

/// Net margin balance (financing minus lending) on the margin days, with the
/// index close on the same days.
pub fn margin_chart(margin: &[RawRecord], index: &[RawRecord], config: &Config) -> Result<Option<ChartBundle>> {
    let fields = &config.fields;
    let aligned = align(
        &[
            SeriesInput::new("financing", margin, &fields.margin_key, &fields.margin_financing),
            SeriesInput::new("lending", margin, &fields.margin_key, &fields.margin_lending),
            SeriesInput::new("index_close", index, &fields.index_key, &fields.index_close),
        ],
        &AlignOptions::primary("financing"),
    );
    if aligned.is_empty() {
        debug!(chart = ChartKind::Margin.name(), "no margin points");
        return Ok(None);
    }

    let mut builder = BundleBuilder::from_aligned(aligned)?;
    let financing = builder.take_series("financing").unwrap_or_default();
    let lending = builder.take_series("lending").unwrap_or_default();
    let net = derive(&financing, &lending, DeriveOp::Difference);
    builder = builder.series("net_balance", net)?;

    Ok(finish(ChartKind::Margin, builder))
}
