use thiserror::Error;

/// Errors raised by currency conversion.
///
/// These are recoverable per-event failures: callers skip the offending
/// amount, record an issue, and continue the computation.
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Currency '{0}' is not supported")]
    UnsupportedCurrency(String),

    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Rate cache error: {0}")]
    CacheError(String),
}
