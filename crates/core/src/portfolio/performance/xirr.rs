//! Money-weighted return (XIRR) over a dated cash-flow schedule.
//!
//! Finds the rate `r` with `Σ flow_i / (1 + r)^(days_i / 365) = 0`. The
//! root is bracketed by bisection and polished with Newton steps where the
//! derivative behaves; the solver returns `None` instead of an inaccurate
//! rate when no root can be found.

use chrono::NaiveDate;
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::deposits::CashFlow;

const RATE_LOWER_BOUND: f64 = -0.9999;
const RATE_UPPER_BOUND: f64 = 10.0;
const MAX_BISECTION_ITERATIONS: usize = 200;
const MAX_NEWTON_ITERATIONS: usize = 20;
const RATE_TOLERANCE: f64 = 1e-9;
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Result of a successful XIRR solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XirrSummary {
    /// Annualized rate as a decimal fraction (0.10 = 10%).
    pub rate: f64,
    pub start_date: NaiveDate,
    pub as_of: NaiveDate,
    pub cash_flow_count: usize,
}

/// Solves for the internal rate of return of a signed, dated schedule.
///
/// The schedule uses the investor's perspective: invested money negative,
/// money received positive. Returns `None` for fewer than two flows, a
/// schedule with no sign change inside the rate bounds, or residuals the
/// iteration budget cannot drive to zero.
pub fn solve_xirr(flows: &[(NaiveDate, f64)]) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let t0 = flows.iter().map(|(date, _)| *date).min()?;

    let npv = |rate: f64| -> f64 {
        flows
            .iter()
            .map(|(date, amount)| {
                let years = (*date - t0).num_days() as f64 / 365.0;
                amount / (1.0 + rate).powf(years)
            })
            .sum()
    };
    let npv_derivative = |rate: f64| -> f64 {
        flows
            .iter()
            .map(|(date, amount)| {
                let years = (*date - t0).num_days() as f64 / 365.0;
                -years * amount / (1.0 + rate).powf(years + 1.0)
            })
            .sum()
    };

    let mut lo = RATE_LOWER_BOUND;
    let mut hi = RATE_UPPER_BOUND;
    let (mut f_lo, f_hi) = (npv(lo), npv(hi));
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo * f_hi > 0.0 {
        debug!("XIRR: no sign change within [{}, {}]", lo, hi);
        return None;
    }

    let mut rate = 0.0;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        rate = (lo + hi) / 2.0;
        let f_mid = npv(rate);
        if f_mid.abs() < RESIDUAL_TOLERANCE || (hi - lo) / 2.0 < RATE_TOLERANCE {
            break;
        }
        if f_lo * f_mid < 0.0 {
            hi = rate;
        } else {
            lo = rate;
            f_lo = f_mid;
        }
    }

    // Newton refinement from the bisection estimate, kept inside the
    // bracket so a wild derivative cannot throw the root away.
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let f = npv(rate);
        if f.abs() < RESIDUAL_TOLERANCE {
            break;
        }
        let df = npv_derivative(rate);
        if !df.is_finite() || df.abs() < f64::EPSILON {
            break;
        }
        let next = rate - f / df;
        if !next.is_finite() || next <= RATE_LOWER_BOUND || next >= RATE_UPPER_BOUND {
            break;
        }
        if (next - rate).abs() < RATE_TOLERANCE {
            rate = next;
            break;
        }
        rate = next;
    }

    if npv(rate).abs() < RESIDUAL_TOLERANCE {
        Some(rate)
    } else {
        debug!("XIRR: residual {} above tolerance", npv(rate).abs());
        None
    }
}

/// Builds the XIRR schedule from the funding flows plus one synthetic final
/// positive flow equal to current equity, and solves it.
///
/// Funding flows are sign-inverted (a deposit is money the investor paid
/// in). Returns `None` when the schedule has fewer than two flows or the
/// solver fails to converge.
pub fn xirr_from_funding(
    flows: &[CashFlow],
    terminal_equity_base: Decimal,
    as_of: NaiveDate,
) -> Option<XirrSummary> {
    let mut schedule: Vec<(NaiveDate, f64)> = flows
        .iter()
        .filter_map(|flow| Some((flow.date, -flow.amount_base.to_f64()?)))
        .collect();
    schedule.push((as_of, terminal_equity_base.to_f64()?));

    if schedule.len() < 2 {
        return None;
    }
    let start_date = schedule.iter().map(|(date, _)| *date).min()?;
    let rate = solve_xirr(&schedule)?;

    Some(XirrSummary {
        rate,
        start_date,
        as_of,
        cash_flow_count: schedule.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_flow_case_yields_ten_percent() {
        let flows = vec![
            (date(2023, 1, 1), -100.0),
            (date(2024, 1, 1), 110.0),
        ];
        let rate = solve_xirr(&flows).unwrap();
        assert!((rate - 0.10).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn test_negative_return() {
        let flows = vec![
            (date(2023, 1, 1), -100.0),
            (date(2024, 1, 1), 80.0),
        ];
        let rate = solve_xirr(&flows).unwrap();
        assert!((rate - (-0.20)).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn test_multi_flow_schedule_converges() {
        let flows = vec![
            (date(2023, 1, 1), -1000.0),
            (date(2023, 7, 1), -500.0),
            (date(2024, 1, 1), 1650.0),
        ];
        let rate = solve_xirr(&flows).unwrap();
        // NPV at the solved rate must be ~zero.
        let npv: f64 = flows
            .iter()
            .map(|(d, a)| {
                let years = (*d - date(2023, 1, 1)).num_days() as f64 / 365.0;
                a / (1.0 + rate).powf(years)
            })
            .sum();
        assert!(npv.abs() < 1e-5);
    }

    #[test]
    fn test_fewer_than_two_flows_is_none() {
        assert!(solve_xirr(&[]).is_none());
        assert!(solve_xirr(&[(date(2023, 1, 1), -100.0)]).is_none());
    }

    #[test]
    fn test_no_root_is_none() {
        // All positive flows: NPV never crosses zero.
        let flows = vec![
            (date(2023, 1, 1), 100.0),
            (date(2024, 1, 1), 110.0),
        ];
        assert!(solve_xirr(&flows).is_none());
    }

    #[test]
    fn test_funding_schedule_inverts_signs_and_appends_equity() {
        let flows = vec![CashFlow {
            date: date(2023, 1, 1),
            amount_base: dec!(100),
        }];
        let summary = xirr_from_funding(&flows, dec!(110), date(2024, 1, 1)).unwrap();

        assert!((summary.rate - 0.10).abs() < 1e-6);
        assert_eq!(summary.cash_flow_count, 2);
        assert_eq!(summary.start_date, date(2023, 1, 1));
        assert_eq!(summary.as_of, date(2024, 1, 1));
    }

    #[test]
    fn test_funding_schedule_with_withdrawal() {
        // Deposit 1000, withdraw 200 halfway, end at 900.
        let flows = vec![
            CashFlow {
                date: date(2023, 1, 1),
                amount_base: dec!(1000),
            },
            CashFlow {
                date: date(2023, 7, 1),
                amount_base: dec!(-200),
            },
        ];
        let summary = xirr_from_funding(&flows, dec!(900), date(2024, 1, 1)).unwrap();
        assert_eq!(summary.cash_flow_count, 3);
        assert!(summary.rate > 0.0);
    }

    #[test]
    fn test_empty_funding_is_none() {
        assert!(xirr_from_funding(&[], dec!(100), date(2024, 1, 1)).is_none());
    }
}
