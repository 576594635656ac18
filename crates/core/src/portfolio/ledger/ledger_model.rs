//! Ledger replay domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::Issue;

/// Mutable per-day book state: cash per currency and shares per symbol.
///
/// Owned exclusively by one replay and discarded once the equity series is
/// produced; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub cash_by_currency: HashMap<String, Decimal>,
    pub shares_by_symbol: HashMap<String, Decimal>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cash(&mut self, currency: &str, delta: Decimal) {
        *self
            .cash_by_currency
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO) += delta;
    }

    pub fn add_shares(&mut self, symbol: &str, delta: Decimal) {
        *self
            .shares_by_symbol
            .entry(symbol.to_string())
            .or_insert(Decimal::ZERO) += delta;
    }
}

/// Output of one full replay: the day-close equity series plus everything
/// that degraded along the way.
#[derive(Debug, Clone, Default)]
pub struct LedgerReplayResult {
    /// Base-currency equity at the close of every day in the period.
    pub equity_by_day: BTreeMap<NaiveDate, Decimal>,
    pub issues: Vec<Issue>,
    /// Symbols that needed a price at least once and never resolved one.
    pub missing_price_symbols: BTreeSet<String>,
}
