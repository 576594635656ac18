//! Activities module - raw records, normalization, and journal detection.

mod activities_constants;
mod activities_errors;
mod activities_model;
mod journal_detector;
mod normalizer;


pub use activities_constants::*;
pub use activities_errors::ActivityError;
pub use activities_model::{ActivityContext, EventKind, NormalizedEvent, RawActivity};
pub use journal_detector::{detect_norbert_journal_completion, JournalDirection, JournalPair};
pub use normalizer::{
    classify_activity, normalize_activity, parse_corporate_action_ratio, resolve_effective_date,
};
