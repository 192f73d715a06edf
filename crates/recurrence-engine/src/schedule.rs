//! Watermark-driven instance generation.
//!
//! A task layer that materializes recurring items keeps, per item, the
//! pattern and the instant of the last generated instance. [`RecurringSchedule`]
//! holds exactly that pair and answers "what is due now?" without touching
//! storage or the clock. Persisting the advanced watermark is the caller's job.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculator::RecurrenceCalculator;
use crate::pattern::RecurrencePattern;

/// A pattern plus the instant of the last generated instance.
///
/// Generation is idempotent: once [`generate_due`](Self::generate_due) has
/// advanced the watermark, asking again for the same `now` yields nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pattern: RecurrencePattern,
    last_generated: NaiveDateTime,
    #[serde(skip)]
    calculator: RecurrenceCalculator,
}

impl RecurringSchedule {
    pub fn new(pattern: RecurrencePattern, last_generated: NaiveDateTime) -> Self {
        Self {
            pattern,
            last_generated,
            calculator: RecurrenceCalculator::default(),
        }
    }

    /// Use a calculator with non-default limits.
    pub fn with_calculator(self, calculator: RecurrenceCalculator) -> Self {
        Self { calculator, ..self }
    }

    pub fn pattern(&self) -> &RecurrencePattern {
        &self.pattern
    }

    pub fn last_generated(&self) -> NaiveDateTime {
        self.last_generated
    }

    /// The first occurrence after the watermark, due or not.
    pub fn next_after_watermark(&self) -> Option<NaiveDateTime> {
        self.calculator
            .next_occurrence(&self.pattern, self.last_generated)
    }

    /// Whether at least one occurrence after the watermark is at or before `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_after_watermark().is_some_and(|next| next <= now)
    }

    /// Every occurrence in `(watermark, now]`, oldest first, at most `limit`.
    ///
    /// The watermark advances to the last returned occurrence. The walk is
    /// also capped by the calculator's `max_iterations`, so a long-dormant
    /// minute-level schedule catches up over several calls.
    pub fn generate_due(&mut self, now: NaiveDateTime, limit: usize) -> Vec<NaiveDateTime> {
        let cap = limit.min(self.calculator.limits().max_iterations);
        let mut due = Vec::new();

        while due.len() < cap {
            match self
                .calculator
                .next_occurrence(&self.pattern, self.last_generated)
            {
                Some(next) if next <= now => {
                    due.push(next);
                    self.last_generated = next;
                }
                _ => break,
            }
        }

        if !due.is_empty() {
            debug!(
                generated = due.len(),
                watermark = %self.last_generated,
                "generated due occurrences"
            );
        }
        due
    }

    /// Occurrences from `now` through `now + days_ahead` days, at most `max_count`.
    ///
    /// Ignores the watermark; this is the preview a schedule view shows.
    pub fn upcoming(&self, now: NaiveDateTime, days_ahead: u32, max_count: usize) -> Vec<NaiveDateTime> {
        let Some(end) = now.checked_add_signed(Duration::days(i64::from(days_ahead))) else {
            return Vec::new();
        };
        self.calculator
            .occurrences_in_range(&self.pattern, now, end, max_count)
            .collect()
    }
}

/// Bucket occurrences by calendar date, times in input order within a day.
pub fn group_by_date<I>(occurrences: I) -> BTreeMap<NaiveDate, Vec<NaiveTime>>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<NaiveTime>> = BTreeMap::new();
    for occurrence in occurrences {
        by_date
            .entry(occurrence.date())
            .or_default()
            .push(occurrence.time());
    }
    by_date
}
