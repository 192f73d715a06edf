//! Error types for recurrence-engine operations.
//!
//! Only pattern construction and deserialization can fail. Calculations over
//! a validly constructed pattern return `Option`/iterators instead.

use thiserror::Error;

/// A recurrence pattern violated one of its construction invariants.
///
/// Each variant names the violated invariant so callers (API layers, CLIs)
/// can branch on the kind of failure instead of matching message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid interval: {0} (must be at least 1)")]
    InvalidInterval(i64),

    #[error("Invalid weekday: {0} (must be between 0 (Monday) and 6 (Sunday))")]
    InvalidWeekday(i64),

    #[error("Invalid day of month: {0} (must be between 1 and 31)")]
    InvalidDayOfMonth(i64),

    #[error("Invalid month of year: {0} (must be between 1 and 12)")]
    InvalidMonthOfYear(i64),

    #[error("Invalid week of month: {0} (must be between -5 and 5, excluding 0)")]
    InvalidWeekOfMonth(i64),

    #[error("Invalid time of day: '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),

    #[error("Invalid max occurrences: {0} (must be at least 1)")]
    InvalidMaxOccurrences(i64),

    #[error("Invalid end date: '{0}'")]
    InvalidEndDate(String),

    #[error("Missing field '{field}' for {kind} pattern")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Unknown recurrence kind: '{0}'")]
    UnknownKind(String),

    #[error("Unsupported recurrence kind: '{0}'")]
    UnsupportedKind(String),

    #[error("Unknown monthly mode: '{0}'")]
    UnknownMonthlyMode(String),

    #[error("Malformed pattern record: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
