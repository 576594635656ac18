//! Core error types and the non-fatal issue taxonomy.
//!
//! Hard errors abort a single engine call; they are rare by design. Most
//! degraded conditions (missing market data, unsupported currencies,
//! unparseable records) surface as [`Issue`] values attached to results so
//! callers can still render a best-effort series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activities::ActivityError;
use crate::fx::FxError;
use crate::market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the reconstruction engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Activity error: {0}")]
    Activity(#[from] ActivityError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

/// Category of a non-fatal, user-facing data-quality note.
///
/// Serialized kebab-case; the API layer forwards these verbatim to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// An activity carried no parseable timestamp and was dropped.
    UnresolvableTimestamp,
    /// No price could be resolved for a held symbol on a valuation date.
    MissingPriceData,
    /// No FX rate could be resolved for a required date.
    MissingFxRate,
    /// An amount was skipped because its currency has no conversion path.
    UnsupportedCurrency,
    /// A corporate action carried no usable ratio and was skipped.
    CorporateActionSkipped,
    /// The assembled series disagrees with the broker-reported balance.
    AggregatePartialData,
}

/// A non-fatal problem encountered during a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            symbol: None,
            date: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.symbol, &self.date) {
            (Some(symbol), Some(date)) => {
                write!(f, "{:?} [{} @ {}]: {}", self.kind, symbol, date, self.message)
            }
            (Some(symbol), None) => write!(f, "{:?} [{}]: {}", self.kind, symbol, self.message),
            (None, Some(date)) => write!(f, "{:?} [{}]: {}", self.kind, date, self.message),
            (None, None) => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}
