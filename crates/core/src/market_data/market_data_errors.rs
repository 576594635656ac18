use thiserror::Error;

/// Errors raised while resolving price history.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Failed to fetch price history: {0}")]
    FetchError(String),

    #[error("No price data available: {0}")]
    NoData(String),

    #[error("Price cache error: {0}")]
    CacheError(String),
}
