//! Per-symbol attribution of the aggregate P&L.
//!
//! Replays the same normalized events restricted to quantity-bearing and
//! income records, grouped per symbol. A detected journal pair folds the
//! source listing into the destination listing so the internal conversion
//! nets to zero instead of showing up as a fake loss on one symbol and a
//! fake gain on the other.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activities::{EventKind, JournalPair, NormalizedEvent};
use crate::errors::{Issue, IssueKind};
use crate::fx::CurrencyService;
use crate::market_data::PriceHistoryService;

/// P&L attribution for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolPnlEntry {
    pub symbol: String,
    pub total_pnl_base: Decimal,
    pub invested_base: Decimal,
    pub market_value_base: Decimal,
}

/// Full per-symbol breakdown as of `end_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolBreakdown {
    pub entries: Vec<SymbolPnlEntry>,
    pub end_date: NaiveDate,
    pub issues: Vec<Issue>,
}

#[derive(Default)]
struct SymbolTally {
    shares: Decimal,
    /// Base-currency cash paid out for the symbol (buys).
    cash_out: Decimal,
    /// Base-currency cash received from the symbol (sells, income).
    cash_in: Decimal,
}

/// Attributes invested capital, market value, and P&L per symbol.
///
/// `invested` is net invested capital (cash out minus cash back); P&L is
/// the current market value over that net investment, so the entries sum
/// to the traded share of the aggregate series.
pub fn decompose_by_symbol(
    events: &[NormalizedEvent],
    journal_pair: Option<&JournalPair>,
    currency_service: &CurrencyService,
    price_service: &PriceHistoryService,
    end_date: NaiveDate,
) -> SymbolBreakdown {
    let mut tallies: BTreeMap<String, SymbolTally> = BTreeMap::new();
    let mut issues: Vec<Issue> = Vec::new();

    let canonical = |symbol: &str| -> String {
        match journal_pair {
            Some(pair) if pair.from_symbol == symbol => pair.to_symbol.clone(),
            _ => symbol.to_string(),
        }
    };

    for event in events {
        let Some(symbol) = event.symbol.as_deref() else {
            continue;
        };
        let relevant = matches!(
            event.kind,
            EventKind::Trade | EventKind::InternalJournal | EventKind::CorporateAction
        ) || (event.kind == EventKind::Income && !event.amount.is_zero());
        if !relevant {
            continue;
        }

        let tally = tallies.entry(canonical(symbol)).or_default();
        tally.shares += event.quantity_delta;

        if event.amount.is_zero() {
            continue;
        }
        match currency_service.convert_to_base(event.amount, &event.currency, event.effective_date)
        {
            Ok(amount_base) => {
                if amount_base.is_sign_negative() {
                    tally.cash_out += -amount_base;
                } else {
                    tally.cash_in += amount_base;
                }
            }
            Err(e) => {
                warn!(
                    "Breakdown: skipped {} {} on {} for {}: {}",
                    event.amount, event.currency, event.effective_date, symbol, e
                );
                issues.push(
                    Issue::new(
                        IssueKind::UnsupportedCurrency,
                        format!("Cash flow for {} skipped: {}", symbol, e),
                    )
                    .with_symbol(symbol)
                    .with_date(event.effective_date),
                );
            }
        }
    }

    let mut entries = Vec::with_capacity(tallies.len());
    for (symbol, tally) in tallies {
        let market_value_base = if tally.shares.is_zero() {
            Decimal::ZERO
        } else {
            match price_service.price_on_date(&symbol, end_date) {
                Some(point) => {
                    match currency_service.convert_to_base(
                        tally.shares * point.price,
                        &point.currency,
                        end_date,
                    ) {
                        Ok(value) => value,
                        Err(e) => {
                            issues.push(
                                Issue::new(
                                    IssueKind::UnsupportedCurrency,
                                    format!("Market value for {} skipped: {}", symbol, e),
                                )
                                .with_symbol(symbol.clone())
                                .with_date(end_date),
                            );
                            Decimal::ZERO
                        }
                    }
                }
                None => {
                    issues.push(
                        Issue::new(
                            IssueKind::MissingPriceData,
                            format!("No price for {}; market value treated as zero", symbol),
                        )
                        .with_symbol(symbol.clone())
                        .with_date(end_date),
                    );
                    Decimal::ZERO
                }
            }
        };

        let invested_base = tally.cash_out - tally.cash_in;
        entries.push(SymbolPnlEntry {
            symbol,
            total_pnl_base: market_value_base - invested_base,
            invested_base,
            market_value_base,
        });
    }

    SymbolBreakdown {
        entries,
        end_date,
        issues,
    }
}
