//! Extraction of the contributed-capital series from the event stream.

use log::warn;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::activities::{EventKind, NormalizedEvent};
use crate::errors::{Issue, IssueKind};
use crate::fx::{CurrencyService, FxError};
use crate::portfolio::deposits::{CashFlow, FundingAccumulation};

/// Filters the event stream to funding flows, converts each to base
/// currency at its own date, and produces the cumulative net-deposit
/// series plus the raw cash-flow schedule for XIRR.
///
/// A flow whose currency cannot be converted is skipped with an issue; the
/// rest of the schedule still stands. The optional manual adjustment (a
/// user-entered correction for off-platform basis) is injected as one
/// additional flow on the earliest funding date, never re-applied per day.
pub fn accumulate_funding(
    events: &[NormalizedEvent],
    currency_service: &CurrencyService,
    manual_adjustment: Option<Decimal>,
) -> FundingAccumulation {
    let mut accumulation = FundingAccumulation::default();
    let mut by_day: BTreeMap<chrono::NaiveDate, Decimal> = BTreeMap::new();

    for event in events {
        if event.kind != EventKind::Funding {
            continue;
        }
        match currency_service.convert_to_base(event.amount, &event.currency, event.effective_date)
        {
            Ok(amount_base) => {
                *by_day.entry(event.effective_date).or_insert(Decimal::ZERO) += amount_base;
            }
            Err(e) => {
                warn!(
                    "Skipping funding flow of {} {} on {}: {}",
                    event.amount, event.currency, event.effective_date, e
                );
                let kind = match e {
                    FxError::UnsupportedCurrency(_) => IssueKind::UnsupportedCurrency,
                    _ => IssueKind::MissingFxRate,
                };
                accumulation.issues.push(
                    Issue::new(kind, format!("Funding flow skipped: {}", e))
                        .with_date(event.effective_date),
                );
            }
        }
    }

    if let Some(adjustment) = manual_adjustment {
        if !adjustment.is_zero() {
            match by_day.keys().next().copied() {
                Some(earliest) => {
                    *by_day.entry(earliest).or_insert(Decimal::ZERO) += adjustment;
                }
                None => {
                    warn!("Manual deposit adjustment ignored: no funding flows to anchor it");
                }
            }
        }
    }

    let mut running = Decimal::ZERO;
    for (date, amount) in by_day {
        running += amount;
        accumulation.cash_flows.push(CashFlow {
            date,
            amount_base: amount,
        });
        accumulation.cumulative_by_day.insert(date, running);
    }

    accumulation
}
