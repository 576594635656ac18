//! Broker activity vocabulary.
//!
//! The `type` and `action` values below are the labels the broker emits on
//! activity records. They are treated as a fixture-driven contract: the
//! classifier consults these first and only falls back to the description
//! regexes for records the labels do not decide.

use regex::Regex;
use std::sync::LazyLock;

/// Security purchases and disposals.
pub const ACTIVITY_TYPE_TRADES: &str = "Trades";

/// Incoming funds from outside the account.
pub const ACTIVITY_TYPE_DEPOSITS: &str = "Deposits";

/// Outgoing funds to the account owner.
pub const ACTIVITY_TYPE_WITHDRAWALS: &str = "Withdrawals";

/// Cash dividends paid into the account.
pub const ACTIVITY_TYPE_DIVIDENDS: &str = "Dividends";

/// Interest earned or charged on cash balances.
pub const ACTIVITY_TYPE_INTEREST: &str = "Interest";

/// Stand-alone platform fees and their rebates.
pub const ACTIVITY_TYPE_FEES: &str = "Fees and rebates";

/// Paired cash legs of an in-account currency exchange.
pub const ACTIVITY_TYPE_FX_CONVERSION: &str = "FX conversion";

/// Cash or assets moved to/from another institution.
pub const ACTIVITY_TYPE_TRANSFERS: &str = "Transfers";

/// Splits, name changes, mergers.
pub const ACTIVITY_TYPE_CORPORATE_ACTIONS: &str = "Corporate actions";

/// Catch-all bucket; classification falls through to `action`/description.
pub const ACTIVITY_TYPE_OTHER: &str = "Other";

/// Action codes seen on activity records.
pub const ACTION_BUY: &str = "Buy";
pub const ACTION_SELL: &str = "Sell";
pub const ACTION_DEPOSIT: &str = "DEP";
pub const ACTION_WITHDRAWAL: &str = "WDR";
pub const ACTION_CONTRIBUTION: &str = "CON";
pub const ACTION_TRANSFER: &str = "TF6";
/// Share journal between listings of the same instrument.
pub const ACTION_JOURNAL: &str = "BRW";
pub const ACTION_DIVIDEND: &str = "DIV";
pub const ACTION_FX_CONVERSION: &str = "FXT";
/// Name change / security replacement.
pub const ACTION_NAME_CHANGE: &str = "NAC";

/// Dividend / distribution wording in descriptions.
pub static DIVIDEND_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(dividend|distribution|dist\b)").expect("Invalid regex pattern")
});

/// Fee / commission wording in descriptions.
pub static FEE_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fee|fees|commission|charge)\b").expect("Invalid regex pattern")
});

/// Interest wording in descriptions.
pub static INTEREST_DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binterest\b").expect("Invalid regex pattern"));

/// Share-journal wording in descriptions.
pub static JOURNAL_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(journal(led)?|transfer(red)?)\b").expect("Invalid regex pattern")
});

/// Corporate-action ratio: `4 FOR 1`, `4:1`, `4-1`.
pub static SPLIT_RATIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:FOR|:|-)\s*(\d+)").expect("Invalid regex pattern")
});
