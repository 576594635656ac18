//! Total P&L series domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Issue;

/// One day of the public Total P&L series.
///
/// `total_pnl_base == equity_base - cumulative_net_deposits_base` holds at
/// every point when market data is complete, and the first point is zero
/// by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPnlPoint {
    pub date: NaiveDate,
    pub equity_base: Decimal,
    pub cumulative_net_deposits_base: Decimal,
    pub total_pnl_base: Decimal,
}

/// Headline numbers for one assembled series.
///
/// The equity here prefers the broker-reported balance snapshot; the
/// per-day points are ledger-derived. When the two disagree beyond
/// tolerance the series carries an aggregate-partial-data issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub total_equity_base: Decimal,
    pub net_deposits_base: Decimal,
    pub total_pnl_base: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation_difference_base: Option<Decimal>,
}

/// Full result of one series computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResult {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end_date: Option<NaiveDate>,
    pub points: Vec<TotalPnlPoint>,
    pub summary: SeriesSummary,
    pub issues: Vec<Issue>,
    pub missing_price_symbols: Vec<String>,
}

impl SeriesResult {
    pub fn empty(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            period_start_date: None,
            period_end_date: None,
            points: Vec::new(),
            summary: SeriesSummary::default(),
            issues: Vec::new(),
            missing_price_symbols: Vec::new(),
        }
    }
}

/// Per-currency balances from the broker's own reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrencyBalance {
    pub total_equity: Decimal,
    pub cash: Decimal,
    pub market_value: Decimal,
}

/// Broker-reported balances, used only for terminal reconciliation.
///
/// `BTreeMap` keeps serialization order stable so the snapshot can take
/// part in a deterministic cache key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub combined: BTreeMap<String, CurrencyBalance>,
}

impl BalanceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }
}

/// Caller-supplied knobs for one computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeOptions {
    /// Restrict the series to the configured CAGR start date (for display
    /// modes that measure from a chosen baseline).
    pub apply_account_cagr_start_date: bool,
    pub account_cagr_start_date: Option<NaiveDate>,
    /// Trim returned points to dates at or after this key. Trimming only;
    /// the baseline is unaffected.
    pub display_start_key: Option<NaiveDate>,
    /// One-off correction for off-platform basis, injected as a single
    /// extra funding flow on the earliest funding date.
    pub manual_deposit_adjustment: Option<Decimal>,
}
