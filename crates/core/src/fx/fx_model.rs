//! FX rate series model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dated series of USD-to-base closing rates.
///
/// Using `BTreeMap` allows O(log N) nearest-date lookups for backfill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FxRateSeries {
    rates: BTreeMap<NaiveDate, Decimal>,
}

impl FxRateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rates(rates: impl IntoIterator<Item = (NaiveDate, Decimal)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, rate: Decimal) {
        self.rates.insert(date, rate);
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// The nearest published rate on or before `date`.
    pub fn rate_on_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates.range(..=date).next_back().map(|(_, rate)| *rate)
    }

    /// The earliest published rate, used to hold the series constant for
    /// dates that precede every observation.
    pub fn earliest_rate(&self) -> Option<Decimal> {
        self.rates.iter().next().map(|(_, rate)| *rate)
    }
}
