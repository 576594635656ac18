//! Detection of matched internal currency-conversion journals.
//!
//! A "Norbert's gambit" conversion shows up as two journal records: shares
//! of one listing leave and the same number of shares of the sibling
//! listing arrive. The pair must be excluded from P&L attribution, so the
//! decomposer folds the source listing into the destination.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::activities::normalizer::{classify_activity, resolve_effective_date};
use crate::activities::{EventKind, RawActivity};
use crate::constants::USD_CURRENCY;

/// Which way the conversion moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalDirection {
    ToUsd,
    ToCad,
}

/// A matched pair of internal share journals.
///
/// Consumed by the per-symbol decomposer only; never part of a persisted
/// series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPair {
    pub from_symbol: String,
    pub to_symbol: String,
    pub quantity: Decimal,
    pub journal_date: NaiveDate,
    pub direction: JournalDirection,
}

#[derive(Debug)]
struct JournalLeg {
    date: NaiveDate,
    symbol: String,
    quantity: Decimal,
    description: String,
    currency: Option<String>,
}

/// Scans the full activity list for the most recent completed journal pair.
///
/// Two journal legs match when they sit on the same or an adjacent date,
/// carry opposite-signed quantities of equal magnitude, and describe a
/// cross-listing of the same underlying. A candidate is stale (skipped)
/// when any later trade exists on the destination symbol: the position has
/// been actively traded since, so the journal no longer represents an open
/// conversion. Returns `None` when no valid pair exists.
pub fn detect_norbert_journal_completion(activities: &[RawActivity]) -> Option<JournalPair> {
    let mut legs: Vec<JournalLeg> = Vec::new();
    let mut trades: Vec<(NaiveDate, String)> = Vec::new();

    for raw in activities {
        let Ok(date) = resolve_effective_date(raw) else {
            continue;
        };
        let Some(symbol) = raw.symbol.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        match classify_activity(raw) {
            EventKind::InternalJournal if !raw.qty().is_zero() => legs.push(JournalLeg {
                date,
                symbol: symbol.to_string(),
                quantity: raw.qty(),
                description: raw.description_str().to_string(),
                currency: raw.currency.clone(),
            }),
            EventKind::Trade => trades.push((date, symbol.to_string())),
            _ => {}
        }
    }

    let mut best: Option<JournalPair> = None;

    for i in 0..legs.len() {
        for j in (i + 1)..legs.len() {
            let (a, b) = (&legs[i], &legs[j]);
            if a.quantity.abs() != b.quantity.abs() {
                continue;
            }
            if a.quantity.is_sign_negative() == b.quantity.is_sign_negative() {
                continue;
            }
            if (a.date - b.date).num_days().abs() > 1 {
                continue;
            }

            let (from, to) = if a.quantity.is_sign_negative() {
                (a, b)
            } else {
                (b, a)
            };
            if !symbols_cross_listed(&from.symbol, &to.symbol)
                && !descriptions_match(&from.description, &to.description)
            {
                continue;
            }

            let journal_date = a.date.max(b.date);
            if trades
                .iter()
                .any(|(date, symbol)| symbol == &to.symbol && *date > journal_date)
            {
                log::debug!(
                    "Journal pair {} -> {} on {} is stale: destination traded afterwards",
                    from.symbol,
                    to.symbol,
                    journal_date
                );
                continue;
            }

            let candidate = JournalPair {
                from_symbol: from.symbol.clone(),
                to_symbol: to.symbol.clone(),
                quantity: to.quantity.abs(),
                journal_date,
                direction: journal_direction(to),
            };

            match &best {
                Some(existing) if existing.journal_date >= candidate.journal_date => {}
                _ => best = Some(candidate),
            }
        }
    }

    best
}

fn journal_direction(to: &JournalLeg) -> JournalDirection {
    let usd_listed = is_usd_listing(&to.symbol)
        || to
            .currency
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(USD_CURRENCY));
    if usd_listed {
        JournalDirection::ToUsd
    } else {
        JournalDirection::ToCad
    }
}

/// USD-denominated sibling listings carry a `.U` marker, e.g. `DLR.U.TO`.
fn is_usd_listing(symbol: &str) -> bool {
    let upper = symbol.to_ascii_uppercase();
    upper.contains(".U.") || upper.ends_with(".U")
}

/// Two symbols are cross-listed when they share a root after stripping the
/// exchange suffix and the `.U` currency marker.
fn symbols_cross_listed(a: &str, b: &str) -> bool {
    !a.eq_ignore_ascii_case(b) && listing_root(a) == listing_root(b)
}

fn listing_root(symbol: &str) -> String {
    let mut root = symbol.trim().to_ascii_uppercase();
    for suffix in [".TO", ".VN", ".NE", ".CN", ".V"] {
        if let Some(stripped) = root.strip_suffix(suffix) {
            root = stripped.to_string();
            break;
        }
    }
    if let Some(stripped) = root.strip_suffix(".U") {
        root = stripped.to_string();
    }
    root
}

fn descriptions_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase()
    };
    let (na, nb) = (normalize(a), normalize(b));
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb {
        return true;
    }
    // Same leading security-name token is enough for sibling listings.
    match (na.split(' ').next(), nb.split(' ').next()) {
        (Some(ta), Some(tb)) => ta.len() >= 3 && ta == tb,
        _ => false,
    }
}
