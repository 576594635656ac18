//! Breakdown module - per-symbol P&L attribution.

mod symbol_decomposer;

pub use symbol_decomposer::{decompose_by_symbol, SymbolBreakdown, SymbolPnlEntry};
