//! Deposits module - contributed-capital extraction from the event stream.

mod deposits_model;
mod deposits_service;

pub use deposits_model::*;
pub use deposits_service::accumulate_funding;
