//! Portfolio module - ledger replay, deposits, performance, and series assembly.

pub mod breakdown;
pub mod deposits;
pub mod ledger;
pub mod performance;
pub mod series;

pub use breakdown::*;
pub use deposits::*;
pub use ledger::*;
pub use performance::*;
pub use series::*;
