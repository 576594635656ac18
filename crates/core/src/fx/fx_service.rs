//! Per-computation currency conversion.
//!
//! One `CurrencyService` is constructed for each series computation from a
//! freshly fetched [`FxRateSeries`] and discarded with it. Nothing is
//! shared across accounts, so a stale rate can never leak between
//! computations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::constants::{BASE_CURRENCY, USD_CURRENCY};
use crate::fx::{FxError, FxRateSeries};

pub struct CurrencyService {
    base_currency: String,
    series: FxRateSeries,
    /// Resolved rate per date, memoized for the lifetime of one computation.
    cache: RwLock<HashMap<NaiveDate, Decimal>>,
}

impl CurrencyService {
    pub fn new(series: FxRateSeries) -> Self {
        Self::with_base_currency(BASE_CURRENCY, series)
    }

    pub fn with_base_currency(base_currency: &str, series: FxRateSeries) -> Self {
        Self {
            base_currency: base_currency.to_string(),
            series,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// The USD-to-base rate for `date`, backfilled.
    ///
    /// A date with no published rate uses the nearest earlier one; a date
    /// that precedes every observation uses the earliest published rate,
    /// held constant going backward. Fails only when the series is empty.
    pub fn rate_for_date(&self, date: NaiveDate) -> Result<Decimal, FxError> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| FxError::CacheError(e.to_string()))?;
            if let Some(rate) = cache.get(&date) {
                return Ok(*rate);
            }
        }

        let rate = self
            .series
            .rate_on_or_before(date)
            .or_else(|| self.series.earliest_rate())
            .ok_or_else(|| {
                FxError::RateNotFound(format!(
                    "{}->{} on {}",
                    USD_CURRENCY, self.base_currency, date
                ))
            })?;

        let mut cache = self
            .cache
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        cache.insert(date, rate);
        Ok(rate)
    }

    /// Converts an amount into the base currency at `date`.
    ///
    /// Identity for the base currency itself; the rate series covers USD.
    /// Anything else is an explicit unsupported-currency failure the caller
    /// must treat as a recoverable per-event condition.
    pub fn convert_to_base(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if currency.eq_ignore_ascii_case(&self.base_currency) {
            return Ok(amount);
        }
        if currency.eq_ignore_ascii_case(USD_CURRENCY) {
            let rate = self.rate_for_date(date)?;
            return Ok(amount * rate);
        }
        Err(FxError::UnsupportedCurrency(currency.to_string()))
    }

    /// Converts a base-currency amount into `currency` at `date`.
    pub fn convert_from_base(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if currency.eq_ignore_ascii_case(&self.base_currency) {
            return Ok(amount);
        }
        if currency.eq_ignore_ascii_case(USD_CURRENCY) {
            let rate = self.rate_for_date(date)?;
            if rate.is_zero() {
                return Err(FxError::RateNotFound(format!(
                    "Zero {}->{} rate on {}",
                    USD_CURRENCY, self.base_currency, date
                )));
            }
            return Ok(amount / rate);
        }
        Err(FxError::UnsupportedCurrency(currency.to_string()))
    }
}
