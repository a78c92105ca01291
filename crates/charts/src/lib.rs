//! Chart assembly for the macro dashboard.
//!
//! Turns raw source records into [`ChartBundle`]s: aligned category axes with
//! source series, derived overlays, axis ranges and an optional band
//! classifier. Everything here is a pure function of its inputs plus the
//! caller's `as_of` date, so charts can be built in parallel.

pub mod bundle;
pub mod dashboard;
pub mod views;

pub use bundle::{BundleBuilder, ChartBundle};
pub use dashboard::{build_chart, build_dashboard, Dashboard, Sources};
pub use views::ChartKind;
