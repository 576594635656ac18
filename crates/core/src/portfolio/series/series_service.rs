//! The engine façade: orchestrates normalization, prefetch, replay, and
//! assembly into the public Total P&L series.
//!
//! Every computation owns freshly-built currency and price caches; nothing
//! mutable is shared across accounts. Derived series are memoized per
//! activity-context fingerprint for the lifetime of the service.

use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::activities::{
    detect_norbert_journal_completion, normalize_activity, ActivityContext, EventKind,
    NormalizedEvent,
};
use crate::constants::{GROUP_ACCOUNT_ID, PRICE_LOOKBACK_DAYS, RECONCILIATION_TOLERANCE};
use crate::errors::{Issue, IssueKind, Result};
use crate::fx::{CurrencyService, FxRateFetcherTrait, FxRateSeries};
use crate::market_data::{PriceHistoryFetcherTrait, PriceHistoryService};
use crate::portfolio::breakdown::{decompose_by_symbol, SymbolBreakdown};
use crate::portfolio::deposits::{accumulate_funding, FundingSummary};
use crate::portfolio::ledger::LedgerCalculator;
use crate::portfolio::performance::xirr_from_funding;
use crate::portfolio::series::{
    BalanceSnapshot, ComputeOptions, SeriesResult, SeriesSummary, TotalPnlPoint,
};

/// Everything one computation needs, built fresh per request.
struct PreparedComputation {
    events: Vec<NormalizedEvent>,
    issues: Vec<Issue>,
    currency_service: CurrencyService,
    price_service: PriceHistoryService,
    period_start: NaiveDate,
    period_end: NaiveDate,
}

pub struct SeriesService {
    price_fetcher: Arc<dyn PriceHistoryFetcherTrait>,
    fx_fetcher: Arc<dyn FxRateFetcherTrait>,
    series_cache: DashMap<String, SeriesResult>,
}

impl SeriesService {
    pub fn new(
        price_fetcher: Arc<dyn PriceHistoryFetcherTrait>,
        fx_fetcher: Arc<dyn FxRateFetcherTrait>,
    ) -> Self {
        Self {
            price_fetcher,
            fx_fetcher,
            series_cache: DashMap::new(),
        }
    }

    /// Computes the daily Total P&L series for one account.
    ///
    /// Always returns a result: partial data degrades into issues on the
    /// result, and an empty or fully unparseable context yields an empty
    /// series.
    pub async fn compute_total_pnl_series(
        &self,
        context: &ActivityContext,
        snapshot: &BalanceSnapshot,
        options: &ComputeOptions,
    ) -> Result<SeriesResult> {
        let cache_key = self.cache_key(context, snapshot, options);
        if let Some(hit) = self.series_cache.get(&cache_key) {
            debug!("Series cache hit for account {}", context.account_id);
            return Ok(hit.clone());
        }

        let prepared = self.prepare(context, options).await;
        let result = self.assemble(context, snapshot, options, prepared);
        self.series_cache.insert(cache_key, result.clone());
        Ok(result)
    }

    /// Computes the funding-level summary: net deposits, total P&L, and the
    /// money-weighted annualized return over the funding schedule.
    pub async fn compute_net_deposits(
        &self,
        context: &ActivityContext,
        snapshot: &BalanceSnapshot,
        options: &ComputeOptions,
    ) -> Result<FundingSummary> {
        let prepared = self.prepare(context, options).await;
        let mut issues = prepared.issues;

        if prepared.events.is_empty() {
            return Ok(FundingSummary {
                account_id: context.account_id.clone(),
                as_of: context.now,
                net_deposits_base: Decimal::ZERO,
                total_equity_base: Decimal::ZERO,
                total_pnl_base: Decimal::ZERO,
                simple_return_pct: None,
                annualized: None,
                cash_flow_count: 0,
                issues,
            });
        }

        let calculator =
            LedgerCalculator::new(&prepared.currency_service, &prepared.price_service);
        let replay = calculator.replay(
            &prepared.events,
            prepared.period_start,
            prepared.period_end,
        );
        let funding = accumulate_funding(
            &prepared.events,
            &prepared.currency_service,
            options.manual_deposit_adjustment,
        );
        issues.extend(replay.issues.iter().cloned());
        issues.extend(funding.issues.iter().cloned());

        let ledger_terminal_equity = replay
            .equity_by_day
            .values()
            .next_back()
            .copied()
            .unwrap_or(Decimal::ZERO);
        let (snapshot_equity, snapshot_issues) = self.snapshot_equity_base(
            snapshot,
            &prepared.currency_service,
            prepared.period_end,
        );
        issues.extend(snapshot_issues);
        let total_equity_base = snapshot_equity.unwrap_or(ledger_terminal_equity);

        let net_deposits_base = funding.net_deposits();
        let total_pnl_base = total_equity_base - net_deposits_base;
        let simple_return_pct = if net_deposits_base.is_zero() {
            None
        } else {
            Some(total_pnl_base / net_deposits_base * dec!(100))
        };
        let annualized =
            xirr_from_funding(&funding.cash_flows, total_equity_base, prepared.period_end);

        Ok(FundingSummary {
            account_id: context.account_id.clone(),
            as_of: prepared.period_end,
            net_deposits_base,
            total_equity_base,
            total_pnl_base,
            simple_return_pct,
            annualized,
            cash_flow_count: funding.cash_flows.len(),
            issues,
        })
    }

    /// Attributes the aggregate P&L across symbols as of the period end.
    pub async fn compute_total_pnl_by_symbol(
        &self,
        context: &ActivityContext,
        options: &ComputeOptions,
    ) -> Result<SymbolBreakdown> {
        let prepared = self.prepare(context, options).await;
        let journal_pair = detect_norbert_journal_completion(&context.activities);

        let mut breakdown = decompose_by_symbol(
            &prepared.events,
            journal_pair.as_ref(),
            &prepared.currency_service,
            &prepared.price_service,
            prepared.period_end,
        );
        breakdown.issues.extend(prepared.issues);
        Ok(breakdown)
    }

    /// Computes the combined series for a group of accounts.
    ///
    /// Each account replays independently with its own caches; the results
    /// are combined by a pure reduction summing equity and deposits per
    /// date bucket. An account that fails contributes an issue instead of
    /// failing the group.
    pub async fn compute_group_total_pnl_series(
        &self,
        inputs: &[(ActivityContext, BalanceSnapshot)],
        options: &ComputeOptions,
    ) -> Result<SeriesResult> {
        let computations = inputs
            .iter()
            .map(|(context, snapshot)| self.compute_total_pnl_series(context, snapshot, options));
        let results = futures::future::join_all(computations).await;

        let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
        let mut summary = SeriesSummary::default();
        let mut issues: Vec<Issue> = Vec::new();
        let mut missing: BTreeSet<String> = BTreeSet::new();
        let mut period_start: Option<NaiveDate> = None;
        let mut period_end: Option<NaiveDate> = None;

        for ((context, _), result) in inputs.iter().zip(results) {
            match result {
                Ok(series) => {
                    for point in &series.points {
                        let bucket = buckets
                            .entry(point.date)
                            .or_insert((Decimal::ZERO, Decimal::ZERO));
                        bucket.0 += point.equity_base;
                        bucket.1 += point.cumulative_net_deposits_base;
                    }
                    summary.total_equity_base += series.summary.total_equity_base;
                    summary.net_deposits_base += series.summary.net_deposits_base;
                    issues.extend(series.issues);
                    missing.extend(series.missing_price_symbols);
                    period_start = merge_min(period_start, series.period_start_date);
                    period_end = merge_max(period_end, series.period_end_date);
                }
                Err(e) => {
                    warn!("Group series: account {} failed: {}", context.account_id, e);
                    issues.push(Issue::new(
                        IssueKind::AggregatePartialData,
                        format!("Account {} excluded from aggregate: {}", context.account_id, e),
                    ));
                }
            }
        }

        let mut points = Vec::with_capacity(buckets.len());
        let mut baseline: Option<Decimal> = None;
        for (date, (equity, deposits)) in buckets {
            let raw_pnl = equity - deposits;
            let base = *baseline.get_or_insert(raw_pnl);
            points.push(TotalPnlPoint {
                date,
                equity_base: equity,
                cumulative_net_deposits_base: deposits,
                total_pnl_base: raw_pnl - base,
            });
        }

        summary.total_pnl_base = summary.total_equity_base - summary.net_deposits_base;

        Ok(SeriesResult {
            account_id: GROUP_ACCOUNT_ID.to_string(),
            period_start_date: period_start,
            period_end_date: period_end,
            points,
            summary,
            issues,
            missing_price_symbols: missing.into_iter().collect(),
        })
    }

    // --- Pipeline internals ---

    /// Normalizes the context and builds the per-computation caches:
    /// one FX series fetch, one bounded-concurrency price prefetch.
    async fn prepare(
        &self,
        context: &ActivityContext,
        options: &ComputeOptions,
    ) -> PreparedComputation {
        let mut events: Vec<NormalizedEvent> = Vec::with_capacity(context.activities.len());
        let mut issues: Vec<Issue> = Vec::new();

        for (index, raw) in context.activities.iter().enumerate() {
            match normalize_activity(raw, index) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Dropping activity {} for account {}: {}",
                        index, context.account_id, e
                    );
                    issues.push(Issue::new(
                        IssueKind::UnresolvableTimestamp,
                        format!("Activity dropped: {}", e),
                    ));
                }
            }
        }
        events.sort_by_key(|e| (e.effective_date, e.source_index));

        let first_event_date = events.first().map(|e| e.effective_date);
        let mut period_start = context
            .earliest_funding
            .or(first_event_date)
            .unwrap_or(context.crawl_start);
        if options.apply_account_cagr_start_date {
            if let Some(cagr_start) = options.account_cagr_start_date {
                period_start = period_start.max(cagr_start);
            }
        }
        let period_end = context.now;

        let fetch_start = period_start - Duration::days(PRICE_LOOKBACK_DAYS);
        let rate_series = match self
            .fx_fetcher
            .fetch_rate_series(fetch_start, period_end)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    "FX rate fetch failed for account {}: {}. Converting with an empty series.",
                    context.account_id, e
                );
                FxRateSeries::new()
            }
        };
        let currency_service = CurrencyService::new(rate_series);

        let symbols: HashSet<String> = events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    EventKind::Trade | EventKind::InternalJournal | EventKind::CorporateAction
                ) || !e.quantity_delta.is_zero()
            })
            .filter_map(|e| e.symbol.clone())
            .collect();

        let price_service = PriceHistoryService::new(Arc::clone(&self.price_fetcher))
            .with_trade_price_hints(&events);
        price_service
            .prefetch(&symbols, fetch_start, period_end)
            .await;

        PreparedComputation {
            events,
            issues,
            currency_service,
            price_service,
            period_start,
            period_end,
        }
    }

    fn assemble(
        &self,
        context: &ActivityContext,
        snapshot: &BalanceSnapshot,
        options: &ComputeOptions,
        prepared: PreparedComputation,
    ) -> SeriesResult {
        let mut issues = prepared.issues;

        if prepared.events.is_empty() {
            debug!(
                "Account {} has no replayable activities; returning empty series",
                context.account_id
            );
            let mut result = SeriesResult::empty(&context.account_id);
            result.issues = issues;
            return result;
        }

        let calculator =
            LedgerCalculator::new(&prepared.currency_service, &prepared.price_service);
        let replay = calculator.replay(
            &prepared.events,
            prepared.period_start,
            prepared.period_end,
        );
        let funding = accumulate_funding(
            &prepared.events,
            &prepared.currency_service,
            options.manual_deposit_adjustment,
        );
        issues.extend(replay.issues.iter().cloned());
        issues.extend(funding.issues.iter().cloned());

        // The first point defines the reporting baseline and is forced to
        // exactly zero; with complete data the shift is zero anyway.
        let mut points = Vec::with_capacity(replay.equity_by_day.len());
        let mut baseline: Option<Decimal> = None;
        for (date, equity) in &replay.equity_by_day {
            let deposits = funding.cumulative_on(*date);
            let raw_pnl = *equity - deposits;
            let base = *baseline.get_or_insert(raw_pnl);
            points.push(TotalPnlPoint {
                date: *date,
                equity_base: *equity,
                cumulative_net_deposits_base: deposits,
                total_pnl_base: raw_pnl - base,
            });
        }
        if let Some(display_start) = options.display_start_key {
            points.retain(|p| p.date >= display_start);
        }

        let ledger_terminal_equity = replay
            .equity_by_day
            .values()
            .next_back()
            .copied()
            .unwrap_or(Decimal::ZERO);
        let (snapshot_equity, snapshot_issues) = self.snapshot_equity_base(
            snapshot,
            &prepared.currency_service,
            prepared.period_end,
        );
        issues.extend(snapshot_issues);

        let net_deposits_base = funding.net_deposits();
        let total_equity_base = snapshot_equity.unwrap_or(ledger_terminal_equity);
        let total_pnl_base = total_equity_base - net_deposits_base;

        // Terminal reconciliation: the summary adopts the broker-reported
        // equity; if the ledger-implied final point disagrees beyond
        // tolerance the series is annotated, never rejected.
        let ledger_terminal_pnl = points
            .last()
            .map(|p| p.total_pnl_base)
            .unwrap_or(Decimal::ZERO);
        let difference = total_pnl_base - ledger_terminal_pnl;
        let reconciliation_difference_base = if difference.abs() > RECONCILIATION_TOLERANCE {
            warn!(
                "Account {}: ledger P&L {} differs from reported {} by {}",
                context.account_id, ledger_terminal_pnl, total_pnl_base, difference
            );
            issues.push(
                Issue::new(
                    IssueKind::AggregatePartialData,
                    format!(
                        "Computed series differs from reported balance by {} at period end",
                        difference
                    ),
                )
                .with_date(prepared.period_end),
            );
            Some(difference)
        } else {
            None
        };

        SeriesResult {
            account_id: context.account_id.clone(),
            period_start_date: Some(prepared.period_start),
            period_end_date: Some(prepared.period_end),
            points,
            summary: SeriesSummary {
                total_equity_base,
                net_deposits_base,
                total_pnl_base,
                reconciliation_difference_base,
            },
            issues,
            missing_price_symbols: replay.missing_price_symbols.into_iter().collect(),
        }
    }

    /// Sums the broker-reported per-currency equities into base currency.
    /// Returns `None` when the snapshot carries no balances at all.
    fn snapshot_equity_base(
        &self,
        snapshot: &BalanceSnapshot,
        currency_service: &CurrencyService,
        date: NaiveDate,
    ) -> (Option<Decimal>, Vec<Issue>) {
        if snapshot.is_empty() {
            return (None, Vec::new());
        }

        let mut total = Decimal::ZERO;
        let mut issues = Vec::new();
        for (currency, balance) in &snapshot.combined {
            match currency_service.convert_to_base(balance.total_equity, currency, date) {
                Ok(value) => total += value,
                Err(e) => {
                    warn!("Snapshot balance in {} skipped: {}", currency, e);
                    issues.push(Issue::new(
                        IssueKind::UnsupportedCurrency,
                        format!("Reported balance in {} skipped: {}", currency, e),
                    ));
                }
            }
        }
        (Some(total), issues)
    }

    fn cache_key(
        &self,
        context: &ActivityContext,
        snapshot: &BalanceSnapshot,
        options: &ComputeOptions,
    ) -> String {
        let options_key = serde_json::to_string(options).unwrap_or_default();
        let snapshot_key = serde_json::to_string(snapshot).unwrap_or_default();
        format!("{}|{}|{}", context.fingerprint, options_key, snapshot_key)
    }
}

fn merge_min(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn merge_max(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
