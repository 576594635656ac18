use thiserror::Error;

/// Errors raised while normalizing raw broker activity records.
#[derive(Error, Debug)]
pub enum ActivityError {
    /// None of the candidate timestamps on the record could be parsed.
    /// The record is dropped and the failure is surfaced as an issue.
    #[error("No parseable timestamp on activity: {0}")]
    UnresolvableTimestamp(String),

    #[error("Invalid activity data: {0}")]
    InvalidData(String),
}
