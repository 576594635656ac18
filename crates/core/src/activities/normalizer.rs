//! Activity normalization: raw broker records into canonical events.
//!
//! Pure functions only. A record either yields one [`NormalizedEvent`],
//! yields `None` for zero-effect noise, or fails with a structured reason
//! that the caller records as an issue. Nothing here throws.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::activities::activities_constants::*;
use crate::activities::{ActivityError, EventKind, NormalizedEvent, RawActivity};
use crate::constants::BASE_CURRENCY;
use crate::utils::time_utils::{activity_date_from_utc, parse_broker_timestamp, DEFAULT_ACTIVITY_TZ};

/// Resolves the effective date of a record from its candidate timestamps.
///
/// Priority: trade date, then transaction date, then settlement date. Each
/// candidate is parsed timezone-aware and floored to a date key in the
/// exchange timezone. Fails only when no candidate parses.
pub fn resolve_effective_date(raw: &RawActivity) -> Result<NaiveDate, ActivityError> {
    let candidates = [&raw.trade_date, &raw.transaction_date, &raw.settlement_date];

    for candidate in candidates.into_iter().flatten() {
        if let Some(instant) = parse_broker_timestamp(candidate, DEFAULT_ACTIVITY_TZ) {
            return Ok(activity_date_from_utc(instant, DEFAULT_ACTIVITY_TZ));
        }
    }

    Err(ActivityError::UnresolvableTimestamp(
        raw.description_str().to_string(),
    ))
}

/// Classifies a record into its canonical [`EventKind`].
///
/// The broker's `type`/`action` labels decide first; the description
/// regexes are a conservative fallback for records the labels leave in the
/// catch-all bucket. Share journals and trades are never funding,
/// regardless of wording.
pub fn classify_activity(raw: &RawActivity) -> EventKind {
    let activity_type = raw.type_str();
    let action = raw.action_str();

    // Journals are labeled inconsistently (often under "Other" or
    // "Transfers"); the action code is authoritative.
    if action.eq_ignore_ascii_case(ACTION_JOURNAL) {
        return EventKind::InternalJournal;
    }
    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_TRANSFERS)
        && raw.symbol.is_some()
        && !raw.qty().is_zero()
        && raw.cash_amount().is_zero()
    {
        return EventKind::InternalJournal;
    }

    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_TRADES) {
        return EventKind::Trade;
    }
    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_DEPOSITS)
        || activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_WITHDRAWALS)
        || activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_TRANSFERS)
    {
        return EventKind::Funding;
    }
    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_DIVIDENDS)
        || activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_INTEREST)
        || activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_FEES)
    {
        return EventKind::Income;
    }
    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_FX_CONVERSION) {
        return EventKind::Other;
    }
    if activity_type.eq_ignore_ascii_case(ACTIVITY_TYPE_CORPORATE_ACTIONS) {
        return EventKind::CorporateAction;
    }

    classify_by_action(raw, action)
}

fn classify_by_action(raw: &RawActivity, action: &str) -> EventKind {
    if action.eq_ignore_ascii_case(ACTION_BUY) || action.eq_ignore_ascii_case(ACTION_SELL) {
        return EventKind::Trade;
    }
    if action.eq_ignore_ascii_case(ACTION_DEPOSIT)
        || action.eq_ignore_ascii_case(ACTION_WITHDRAWAL)
        || action.eq_ignore_ascii_case(ACTION_CONTRIBUTION)
        || action.eq_ignore_ascii_case(ACTION_TRANSFER)
    {
        return EventKind::Funding;
    }
    if action.eq_ignore_ascii_case(ACTION_DIVIDEND) {
        return EventKind::Income;
    }
    if action.eq_ignore_ascii_case(ACTION_FX_CONVERSION) {
        return EventKind::Other;
    }
    if action.eq_ignore_ascii_case(ACTION_NAME_CHANGE) {
        return EventKind::CorporateAction;
    }

    classify_by_description(raw)
}

fn classify_by_description(raw: &RawActivity) -> EventKind {
    let description = raw.description_str();

    // Most specific first: a described journal must actually move shares
    // without moving cash.
    if JOURNAL_DESC_RE.is_match(description)
        && raw.symbol.is_some()
        && !raw.qty().is_zero()
        && raw.cash_amount().is_zero()
    {
        return EventKind::InternalJournal;
    }
    if DIVIDEND_DESC_RE.is_match(description) || INTEREST_DESC_RE.is_match(description) {
        return EventKind::Income;
    }
    if FEE_DESC_RE.is_match(description) {
        return EventKind::Income;
    }

    EventKind::Other
}

/// Derives the canonical event for one raw record.
///
/// Returns `Ok(None)` for zero-effect noise (no cash, no shares, nothing to
/// replay). Returns `Err` only for a record with no parseable timestamp;
/// the caller drops it and records the reason.
pub fn normalize_activity(
    raw: &RawActivity,
    source_index: usize,
) -> Result<Option<NormalizedEvent>, ActivityError> {
    let effective_date = resolve_effective_date(raw)?;
    let kind = classify_activity(raw);
    let amount = raw.cash_amount();
    let quantity_delta = raw.qty();

    let zero_effect = amount.is_zero() && quantity_delta.is_zero();
    if zero_effect && matches!(kind, EventKind::Other) {
        return Ok(None);
    }

    let currency = raw
        .currency
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(BASE_CURRENCY)
        .to_string();

    Ok(Some(NormalizedEvent {
        effective_date,
        kind,
        amount,
        currency,
        symbol: raw.symbol.clone().filter(|s| !s.is_empty()),
        quantity_delta,
        price: raw.price.filter(|p| !p.is_zero()),
        description: raw.description_str().to_string(),
        source_index,
    }))
}

/// Parses a share ratio out of a corporate-action description.
///
/// Returns the multiplier `new / old` for descriptions carrying `N FOR M`,
/// `N:M`, or `N-M`. `None` when no ratio is present or the ratio is
/// degenerate.
pub fn parse_corporate_action_ratio(description: &str) -> Option<Decimal> {
    let captures = SPLIT_RATIO_RE.captures(description)?;
    let new_count: Decimal = captures.get(1)?.as_str().parse().ok()?;
    let old_count: Decimal = captures.get(2)?.as_str().parse().ok()?;
    if old_count.is_zero() || new_count.is_zero() {
        return None;
    }
    Some(new_count / old_count)
}
