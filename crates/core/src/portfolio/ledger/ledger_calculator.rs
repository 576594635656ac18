//! Sequential daily ledger replay.
//!
//! Replays the normalized event stream chronologically, one state
//! transition per calendar day, and values the book at every day close.
//! The replay is deterministic and side-effect-free: it reads only the
//! pre-populated currency and price caches and owns its `LedgerState` for
//! the duration of one call.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::activities::{parse_corporate_action_ratio, EventKind, NormalizedEvent};
use crate::errors::{Issue, IssueKind};
use crate::fx::{CurrencyService, FxError};
use crate::market_data::PriceHistoryService;
use crate::portfolio::ledger::{LedgerReplayResult, LedgerState};
use crate::utils::time_utils::get_days_between;

pub struct LedgerCalculator<'a> {
    currency_service: &'a CurrencyService,
    price_service: &'a PriceHistoryService,
}

impl<'a> LedgerCalculator<'a> {
    pub fn new(
        currency_service: &'a CurrencyService,
        price_service: &'a PriceHistoryService,
    ) -> Self {
        Self {
            currency_service,
            price_service,
        }
    }

    /// Replays `events` and values the book at the close of every day in
    /// `[start, end]`.
    ///
    /// Events are applied in `(effective_date, source_index)` order; events
    /// dated before `start` are folded into the opening state of the first
    /// day, events after `end` are ignored. Nothing here aborts: degraded
    /// valuations surface through the result's issues.
    pub fn replay(
        &self,
        events: &[NormalizedEvent],
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerReplayResult {
        let mut ordered: Vec<&NormalizedEvent> = events.iter().collect();
        ordered.sort_by_key(|e| (e.effective_date, e.source_index));

        let mut result = LedgerReplayResult::default();
        let mut state = LedgerState::new();
        let mut flagged: HashSet<String> = HashSet::new();
        let mut cursor = 0;

        for day in get_days_between(start, end) {
            while cursor < ordered.len() && ordered[cursor].effective_date <= day {
                self.apply_event(ordered[cursor], &mut state, &mut result);
                cursor += 1;
            }

            let equity = self.value_at_close(&state, day, &mut result, &mut flagged);
            result.equity_by_day.insert(day, equity);
        }

        debug!(
            "Replayed {} events over {} days ({} issues)",
            events.len(),
            result.equity_by_day.len(),
            result.issues.len()
        );
        result
    }

    fn apply_event(
        &self,
        event: &NormalizedEvent,
        state: &mut LedgerState,
        result: &mut LedgerReplayResult,
    ) {
        match event.kind {
            EventKind::Funding => {
                state.add_cash(&event.currency, event.amount);
                // In-kind external transfers also move shares.
                if let Some(symbol) = event.symbol.as_deref() {
                    if !event.quantity_delta.is_zero() {
                        state.add_shares(symbol, event.quantity_delta);
                    }
                }
            }
            EventKind::Trade => {
                state.add_cash(&event.currency, event.amount);
                if let Some(symbol) = event.symbol.as_deref() {
                    state.add_shares(symbol, event.quantity_delta);
                }
            }
            EventKind::Income | EventKind::Other => {
                state.add_cash(&event.currency, event.amount);
            }
            EventKind::InternalJournal => {
                // Shares move on each leg; cash never does.
                if let Some(symbol) = event.symbol.as_deref() {
                    state.add_shares(symbol, event.quantity_delta);
                }
            }
            EventKind::CorporateAction => self.apply_corporate_action(event, state, result),
        }
    }

    fn apply_corporate_action(
        &self,
        event: &NormalizedEvent,
        state: &mut LedgerState,
        result: &mut LedgerReplayResult,
    ) {
        let Some(symbol) = event.symbol.as_deref() else {
            result.issues.push(
                Issue::new(
                    IssueKind::CorporateActionSkipped,
                    "Corporate action without a symbol skipped",
                )
                .with_date(event.effective_date),
            );
            return;
        };

        // An explicit share delta is authoritative; otherwise a parseable
        // ratio rescales the held quantity.
        if !event.quantity_delta.is_zero() {
            state.add_shares(symbol, event.quantity_delta);
            return;
        }

        match parse_corporate_action_ratio(&event.description) {
            Some(ratio) => {
                if let Some(held) = state.shares_by_symbol.get_mut(symbol) {
                    *held *= ratio;
                }
            }
            None => {
                warn!(
                    "Unparseable corporate action for {} on {}: {}",
                    symbol, event.effective_date, event.description
                );
                result.issues.push(
                    Issue::new(
                        IssueKind::CorporateActionSkipped,
                        format!("Could not parse ratio from '{}'", event.description),
                    )
                    .with_symbol(symbol)
                    .with_date(event.effective_date),
                );
            }
        }
    }

    /// Values the book in base currency at the close of `day`.
    ///
    /// A symbol with no resolvable price contributes zero (never NaN) and
    /// is flagged once; cash in an unconvertible currency is skipped with
    /// an issue. Weekends and holidays resolve through forward-fill in the
    /// providers, never interpolation.
    fn value_at_close(
        &self,
        state: &LedgerState,
        day: NaiveDate,
        result: &mut LedgerReplayResult,
        flagged: &mut HashSet<String>,
    ) -> Decimal {
        let mut equity = Decimal::ZERO;

        for (symbol, shares) in &state.shares_by_symbol {
            if shares.is_zero() {
                continue;
            }
            let Some(point) = self.price_service.price_on_date(symbol, day) else {
                if result.missing_price_symbols.insert(symbol.clone()) {
                    result.issues.push(
                        Issue::new(
                            IssueKind::MissingPriceData,
                            format!("No price history for {}; valued at zero", symbol),
                        )
                        .with_symbol(symbol.clone())
                        .with_date(day),
                    );
                }
                continue;
            };

            match self
                .currency_service
                .convert_to_base(*shares * point.price, &point.currency, day)
            {
                Ok(value) => equity += value,
                Err(e) => {
                    self.record_conversion_issue(e, symbol, day, result, flagged);
                }
            }
        }

        for (currency, amount) in &state.cash_by_currency {
            if amount.is_zero() {
                continue;
            }
            match self.currency_service.convert_to_base(*amount, currency, day) {
                Ok(value) => equity += value,
                Err(e) => {
                    self.record_conversion_issue(e, currency, day, result, flagged);
                }
            }
        }

        equity
    }

    fn record_conversion_issue(
        &self,
        error: FxError,
        subject: &str,
        day: NaiveDate,
        result: &mut LedgerReplayResult,
        flagged: &mut HashSet<String>,
    ) {
        if !flagged.insert(subject.to_string()) {
            return;
        }
        let kind = match error {
            FxError::UnsupportedCurrency(_) => IssueKind::UnsupportedCurrency,
            _ => IssueKind::MissingFxRate,
        };
        warn!("Conversion failed for {} on {}: {}", subject, day, error);
        result.issues.push(
            Issue::new(kind, format!("Skipped {}: {}", subject, error))
                .with_symbol(subject)
                .with_date(day),
        );
    }
}
