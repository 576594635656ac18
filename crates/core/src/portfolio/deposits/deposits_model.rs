//! Net-deposit domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Issue;
use crate::portfolio::performance::XirrSummary;

/// One funding-only cash flow in base currency.
///
/// Positive for money the account receives from outside, negative for money
/// leaving to the owner. Trades and internal journals never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount_base: Decimal,
}

/// Everything derived from the funding stream of one account.
#[derive(Debug, Clone, Default)]
pub struct FundingAccumulation {
    /// One flow per day with funding activity, chronological.
    pub cash_flows: Vec<CashFlow>,
    /// Running sum of contributed capital, keyed by day.
    pub cumulative_by_day: BTreeMap<NaiveDate, Decimal>,
    pub issues: Vec<Issue>,
}

impl FundingAccumulation {
    /// Contributed capital as of `date` (zero before the first funding).
    pub fn cumulative_on(&self, date: NaiveDate) -> Decimal {
        self.cumulative_by_day
            .range(..=date)
            .next_back()
            .map(|(_, total)| *total)
            .unwrap_or(Decimal::ZERO)
    }

    /// Final contributed capital.
    pub fn net_deposits(&self) -> Decimal {
        self.cumulative_by_day
            .values()
            .next_back()
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Funding-level account summary returned by `compute_net_deposits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingSummary {
    pub account_id: String,
    pub as_of: NaiveDate,
    pub net_deposits_base: Decimal,
    pub total_equity_base: Decimal,
    pub total_pnl_base: Decimal,
    /// Total P&L over contributed capital, as a percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_return_pct: Option<Decimal>,
    /// Money-weighted annualized return over the funding schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized: Option<XirrSummary>,
    pub cash_flow_count: usize,
    pub issues: Vec<Issue>,
}
