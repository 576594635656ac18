//! Market data module - price history resolution and caching.

mod market_data_errors;
mod market_data_model;
mod market_data_service;
mod market_data_traits;

pub use market_data_errors::MarketDataError;
pub use market_data_model::{PricePoint, PriceSeries};
pub use market_data_service::PriceHistoryService;
pub use market_data_traits::PriceHistoryFetcherTrait;
