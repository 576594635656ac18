//! Performance module - money-weighted return calculation.

mod xirr;

pub use xirr::{solve_xirr, xirr_from_funding, XirrSummary};
