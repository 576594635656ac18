//! FX (Foreign Exchange) module - rate series and conversion service.

mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use fx_errors::FxError;
pub use fx_model::FxRateSeries;
pub use fx_service::CurrencyService;
pub use fx_traits::FxRateFetcherTrait;
