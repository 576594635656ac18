//! Per-computation price history resolution.
//!
//! One `PriceHistoryService` is built per series computation. The symbol
//! set is derived once per request (union of traded and held symbols),
//! prefetched with bounded concurrency, and the replay then runs purely
//! against the in-memory cache.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::activities::{EventKind, NormalizedEvent};
use crate::constants::PRICE_FETCH_CONCURRENCY;
use crate::market_data::{PricePoint, PriceHistoryFetcherTrait, PriceSeries};

struct HintSeries {
    currency: String,
    prices: BTreeMap<NaiveDate, Decimal>,
}

pub struct PriceHistoryService {
    fetcher: Arc<dyn PriceHistoryFetcherTrait>,
    series_by_symbol: RwLock<HashMap<String, PriceSeries>>,
    hints_by_symbol: HashMap<String, HintSeries>,
}

impl PriceHistoryService {
    pub fn new(fetcher: Arc<dyn PriceHistoryFetcherTrait>) -> Self {
        Self {
            fetcher,
            series_by_symbol: RwLock::new(HashMap::new()),
            hints_by_symbol: HashMap::new(),
        }
    }

    /// Registers activity-embedded trade prices as fallback hints.
    ///
    /// Used when a symbol has no stored history at all up to a valuation
    /// date (delisted or unlisted instruments): the nearest trade price at
    /// or before the date stands in.
    pub fn with_trade_price_hints(mut self, events: &[NormalizedEvent]) -> Self {
        for event in events {
            if event.kind != EventKind::Trade || event.quantity_delta.is_zero() {
                continue;
            }
            let (Some(symbol), Some(price)) = (event.symbol.as_deref(), event.hint_price()) else {
                continue;
            };
            self.hints_by_symbol
                .entry(symbol.to_string())
                .or_insert_with(|| HintSeries {
                    currency: event.currency.clone(),
                    prices: BTreeMap::new(),
                })
                .prices
                .insert(event.effective_date, price);
        }
        self
    }

    /// Fetches the price history for every symbol in the set, at most
    /// [`PRICE_FETCH_CONCURRENCY`] requests in flight. A failed fetch
    /// degrades to an empty series; the ledger flags the symbol when a
    /// valuation actually needs it.
    pub async fn prefetch(&self, symbols: &HashSet<String>, start: NaiveDate, end: NaiveDate) {
        if symbols.is_empty() {
            return;
        }

        let fetched: Vec<(String, Option<PriceSeries>)> = stream::iter(symbols.iter().cloned())
            .map(|symbol| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    match fetcher.fetch_price_series(&symbol, start, end).await {
                        Ok(series) => (symbol, Some(series)),
                        Err(e) => {
                            warn!("Price fetch failed for {}: {}", symbol, e);
                            (symbol, None)
                        }
                    }
                }
            })
            .buffer_unordered(PRICE_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut cache = match self.series_by_symbol.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (symbol, series) in fetched {
            debug!(
                "Prefetched {} closes for {}",
                series.as_ref().map(|s| s.len()).unwrap_or(0),
                symbol
            );
            let series = series.unwrap_or_else(|| PriceSeries::new(symbol.clone(), ""));
            cache.insert(symbol, series);
        }
    }

    /// Resolves the closing price for `symbol` on `date`.
    ///
    /// Resolution order: stored history forward-filled from the most recent
    /// observation on or before the date; the nearest activity-embedded
    /// trade price at or before the date when no stored history precedes
    /// it; otherwise unresolved (`None`). Prices are never back-filled
    /// from the future.
    pub fn price_on_date(&self, symbol: &str, date: NaiveDate) -> Option<PricePoint> {
        {
            let cache = match self.series_by_symbol.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(series) = cache.get(symbol) {
                if let Some(close) = series.close_on_or_before(date) {
                    return Some(PricePoint {
                        price: close,
                        currency: series.currency.clone(),
                        from_hint: false,
                    });
                }
            }
        }

        let hints = self.hints_by_symbol.get(symbol)?;
        hints
            .prices
            .range(..=date)
            .next_back()
            .map(|(_, price)| PricePoint {
                price: *price,
                currency: hints.currency.clone(),
                from_hint: true,
            })
    }
}
