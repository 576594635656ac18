//! Price history domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closing-price history for one symbol in its native currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSeries {
    pub symbol: String,
    pub currency: String,
    closes: BTreeMap<NaiveDate, Decimal>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            currency: currency.into(),
            closes: BTreeMap::new(),
        }
    }

    pub fn from_closes(
        symbol: impl Into<String>,
        currency: impl Into<String>,
        closes: impl IntoIterator<Item = (NaiveDate, Decimal)>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            currency: currency.into(),
            closes: closes.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, close: Decimal) {
        self.closes.insert(date, close);
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Forward-fill lookup: the most recent close on or before `date`.
    /// Never reads future observations.
    pub fn close_on_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        self.closes.range(..=date).next_back().map(|(_, c)| *c)
    }
}

/// A resolved price for one symbol on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub price: Decimal,
    pub currency: String,
    /// True when the price came from an activity-embedded trade price
    /// rather than stored history.
    pub from_hint: bool,
}
