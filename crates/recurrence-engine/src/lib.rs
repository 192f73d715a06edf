//! # recurrence-engine
//!
//! Deterministic recurrence calculation for recurring tasks.
//!
//! Given a validated [`RecurrencePattern`] (daily, weekly, monthly, or yearly,
//! with an interval and optional times of day) and a reference instant, the
//! engine computes the next occurrence strictly after that instant, or every
//! occurrence inside a bounded window. All computation is pure: no clock, no
//! I/O, no shared state.
//!
//! ## Modules
//!
//! - [`pattern`] — Validated, immutable recurrence rules and their builders
//! - [`record`] — Flat serialized form of a pattern and the JSON helpers
//! - [`calculator`] — Next occurrence and bounded range enumeration
//! - [`presets`] — Named shortcuts for common patterns
//! - [`schedule`] — Watermark-driven generation of due instances
//! - [`calendar`] — Month arithmetic and nth-weekday lookup
//! - [`error`] — Error types

pub mod calculator;
pub mod calendar;
pub mod error;
pub mod pattern;
pub mod presets;
pub mod record;
pub mod schedule;

pub use calculator::{
    next_occurrence, occurrences_in_range, CalculatorLimits, Occurrences, RecurrenceCalculator,
};
pub use error::ValidationError;
pub use pattern::{Frequency, MonthlyMode, MonthlyRule, RecurrencePattern, Rule, TimeOfDay};
pub use record::{format_instant, parse_instant, PatternRecord};
pub use schedule::{group_by_date, RecurringSchedule};
