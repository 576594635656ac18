//! Ledger module - daily replay of normalized events into an equity series.

pub mod ledger_calculator;
mod ledger_model;

pub use ledger_calculator::*;
pub use ledger_model::*;

#[cfg(test)]
mod ledger_calculator_tests;
