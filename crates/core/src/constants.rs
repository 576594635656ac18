use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reporting (base) currency for all derived series
pub const BASE_CURRENCY: &str = "CAD";

/// The only non-base currency with a published rate series
pub const USD_CURRENCY: &str = "USD";

/// Aggregate account ID for combined (multi-account) series
pub const GROUP_ACCOUNT_ID: &str = "TOTAL";

/// Maximum in-flight price-history fetches during prefetch
pub const PRICE_FETCH_CONCURRENCY: usize = 4;

/// Lookback window so the first days of a series have a prior close to fill from
pub const PRICE_LOOKBACK_DAYS: i64 = 30;

/// Terminal reconciliation tolerance, in base currency
pub const RECONCILIATION_TOLERANCE: Decimal = dec!(0.01);
