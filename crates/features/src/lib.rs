//! Derived metrics for the macro-charts system.
//!
//! This crate handles:
//! - Point-wise derived series (difference, ratio, percentage)
//! - Mean/std summaries and band lines
//! - Symmetric axis ranges
//! - Valuation band classification
//! - Equity risk premium and market-cap/GDP derivations

pub mod derive;
pub mod stats;
pub mod axis;
pub mod classifier;
pub mod premium;
pub mod buffett;

pub use derive::{derive, prefer_reported, DeriveOp};
pub use stats::{band_overlays, summarize};
pub use axis::symmetric_range;
pub use classifier::{classify, BandClassifier};
pub use premium::{PremiumCalculator, PremiumMode, PremiumSeries};
pub use buffett::market_cap_to_gdp;
