use crate::errors::Result;
use crate::fx::FxRateSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Contract for fetching the USD-to-base rate history.
///
/// Implemented by the calling layer over whatever FX source it uses;
/// test doubles implement it over fixture maps. The engine fetches one
/// range per computation and never refreshes mid-replay.
#[async_trait]
pub trait FxRateFetcherTrait: Send + Sync {
    async fn fetch_rate_series(&self, start: NaiveDate, end: NaiveDate) -> Result<FxRateSeries>;
}
