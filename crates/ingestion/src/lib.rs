//! Data ingestion and alignment for the macro-charts system.
//!
//! This crate handles:
//! - Key and value extraction from heterogeneous records
//! - Quarter label to month-end mapping
//! - Alignment of several series onto one category axis

pub mod normalizer;
pub mod period;
pub mod aligner;

pub use normalizer::{extract_value, has_field, normalize_key, NormalizationStats, Normalizer};
pub use period::{month_end_value, quarter_to_month_key, DailySeries, QuarterCoverage};
pub use aligner::{align, reported_on_axis, resample, AlignOptions, RecencyWindow, SeriesInput};
