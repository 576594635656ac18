//! Northfolio Core - activity replay and total-return reconstruction.
//!
//! This crate contains the engine that rebuilds a day-by-day equity and
//! contributed-capital history from raw broker activity records. It is
//! transport-agnostic: prices, FX rates, and activities arrive through
//! traits implemented by the calling layer.

pub mod activities;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod market_data;
pub mod portfolio;
pub mod utils;

// Re-export common types from the activity and portfolio modules
pub use activities::*;
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
pub use errors::{Issue, IssueKind};
