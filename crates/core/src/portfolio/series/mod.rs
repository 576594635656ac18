//! Series module - assembly of the public Total P&L series.

mod series_model;
mod series_service;

pub use series_model::*;
pub use series_service::SeriesService;
