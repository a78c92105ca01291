//! Core types and configuration for the macro-charts system.
//!
//! This crate provides shared types used across all other crates:
//! - Raw source records and period keys
//! - Aligned series, statistics and labels
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FieldCandidates, StatsScope};
pub use error::{Error, Result};
pub use types::*;
