//! Activity domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A broker activity record exactly as fetched.
///
/// Every field is optional because the broker omits whatever does not apply
/// to a record type. Instances are never mutated; the normalizer derives a
/// [`NormalizedEvent`] and all downstream logic operates on that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawActivity {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub action: Option<String>,
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub description: Option<String>,
    pub currency: Option<String>,

    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub net_amount: Option<Decimal>,

    // Candidate timestamps, kept as raw strings. Resolution priority is
    // trade date, then transaction date, then settlement date.
    pub trade_date: Option<String>,
    pub transaction_date: Option<String>,
    pub settlement_date: Option<String>,
}

impl RawActivity {
    /// Get quantity, defaulting to zero if not set
    pub fn qty(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO)
    }

    /// Signed cash effect of this record in its own currency.
    /// Prefers the broker's net amount; falls back to gross plus commission
    /// (the commission is already negative on the wire).
    pub fn cash_amount(&self) -> Decimal {
        match self.net_amount {
            Some(net) => net,
            None => {
                self.gross_amount.unwrap_or(Decimal::ZERO)
                    + self.commission.unwrap_or(Decimal::ZERO)
            }
        }
    }

    pub fn description_str(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn type_str(&self) -> &str {
        self.activity_type.as_deref().unwrap_or("")
    }

    pub fn action_str(&self) -> &str {
        self.action.as_deref().unwrap_or("")
    }
}

/// Closed set of canonical event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Deposit, withdrawal, or external transfer. The only kind that moves
    /// contributed capital.
    Funding,
    /// Security purchase or disposal: shares and cash move together.
    Trade,
    /// Dividends, interest, fees, rebates: cash only.
    Income,
    /// Share journal between two listings of the same instrument: shares
    /// move on both legs, cash does not.
    InternalJournal,
    /// Split / name change: shares adjust by a parsed ratio.
    CorporateAction,
    /// Everything else with a cash effect (e.g. FX-conversion legs).
    Other,
}

/// Canonical, fully-resolved form of one activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Date key in the exchange timezone.
    pub effective_date: NaiveDate,
    pub kind: EventKind,
    /// Signed cash effect in `currency`.
    pub amount: Decimal,
    pub currency: String,
    pub symbol: Option<String>,
    /// Signed share effect for `symbol` (zero for cash-only records).
    pub quantity_delta: Decimal,
    /// Activity-embedded unit price, kept as a valuation hint.
    pub price: Option<Decimal>,
    /// Original description, kept for diagnostics and ratio parsing.
    pub description: String,
    /// Position in the raw activity list; stable tie-break within a day.
    pub source_index: usize,
}

impl NormalizedEvent {
    /// Unit price for hint purposes: the embedded price when present,
    /// otherwise the per-share cash amount. A record with no price and no
    /// cash effect carries no hint.
    pub fn hint_price(&self) -> Option<Decimal> {
        if let Some(price) = self.price {
            if !price.is_zero() {
                return Some(price);
            }
        }
        if self.quantity_delta.is_zero() || self.amount.is_zero() {
            return None;
        }
        Some((self.amount / self.quantity_delta).abs())
    }
}

/// The per-account unit of work consumed by every engine entry point.
///
/// Built by the calling layer from already-fetched data; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContext {
    pub account_id: String,
    /// First date money entered the account, when known.
    pub earliest_funding: Option<NaiveDate>,
    /// First date the activity crawl covers.
    pub crawl_start: NaiveDate,
    pub activities: Vec<RawActivity>,
    /// The as-of date for the computation.
    pub now: NaiveDate,
    /// Cache key over the activity payload; identical input data must
    /// produce an identical fingerprint.
    pub fingerprint: String,
}
