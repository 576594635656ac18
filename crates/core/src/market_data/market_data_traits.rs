use crate::errors::Result;
use crate::market_data::PriceSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Contract for fetching closing-price history for one symbol.
///
/// Implemented by the calling layer; the engine only ever calls it during
/// the prefetch phase, with bounded concurrency, before a replay begins.
#[async_trait]
pub trait PriceHistoryFetcherTrait: Send + Sync {
    async fn fetch_price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}
