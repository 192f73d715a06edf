//! Next-occurrence and range computation over a [`RecurrencePattern`].
//!
//! Every function here is pure: no clock access, no I/O, no shared state. The
//! caller supplies the reference instant, and the same inputs always produce
//! the same outputs, which is what lets a storage layer de-duplicate generated
//! instances by occurrence timestamp.
//!
//! # Functions
//!
//! - [`next_occurrence`]: the earliest instant strictly after a reference
//! - [`occurrences_in_range`]: a lazy, bounded walk over a window
//!
//! [`RecurrenceCalculator`] carries the loop bounds ([`CalculatorLimits`]) for
//! callers that need something other than the defaults.

use std::iter::FusedIterator;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use tracing::{debug, trace};

use crate::calendar::{add_months, last_day_of_month, nth_weekday_of_month, weekday_ordinal};
use crate::pattern::{MonthlyRule, RecurrencePattern, Rule, TimeOfDay};

// ── Limits ──────────────────────────────────────────────────────────────────

/// Loop bounds that guarantee termination on pathological patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorLimits {
    /// How many interval steps a monthly search may take looking for a month
    /// that contains the target day or weekday ordinal.
    pub max_month_steps: u32,
    /// How many occurrences a single range walk may produce.
    pub max_iterations: usize,
}

impl Default for CalculatorLimits {
    fn default() -> Self {
        Self {
            max_month_steps: 60,
            max_iterations: 1000,
        }
    }
}

// ── RecurrenceCalculator ────────────────────────────────────────────────────

/// Stateless occurrence calculator.
///
/// Holds nothing but its [`CalculatorLimits`], so it is `Copy` and can be
/// shared freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecurrenceCalculator {
    limits: CalculatorLimits,
}

impl RecurrenceCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: CalculatorLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> CalculatorLimits {
        self.limits
    }

    /// The earliest occurrence strictly after `after`.
    ///
    /// Returns `None` when `after` is at or past the pattern's end date, when
    /// the computed occurrence would be at or past the end date, for a weekly
    /// pattern with no weekdays, or when a monthly search exhausts
    /// [`CalculatorLimits::max_month_steps`].
    pub fn next_occurrence(
        &self,
        pattern: &RecurrencePattern,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        if pattern.end_date().is_some_and(|end| after >= end) {
            return None;
        }

        trace!(frequency = %pattern.frequency(), %after, "computing next occurrence");

        let next = match pattern.rule() {
            Rule::Daily => next_daily(pattern, after),
            Rule::Weekly { weekdays } => next_weekly(pattern, weekdays, after),
            Rule::Monthly(rule) => self.next_monthly(pattern, rule, after),
            Rule::Yearly { month, day } => next_yearly(pattern, *month, *day, after),
        }?;

        match pattern.end_date() {
            Some(end) if next >= end => None,
            _ => Some(next),
        }
    }

    /// Walk occurrences from `start` towards `end`.
    ///
    /// The walk repeatedly asks for the next occurrence after a cursor instant.
    /// After each hit the cursor moves one minute past it when the pattern has
    /// several times of day (so later times on the same day are found), and
    /// one day past it otherwise. It stops at the first occurrence later than
    /// `end`, after `max_count` results, after the pattern's own
    /// `max_occurrences`, or at [`CalculatorLimits::max_iterations`].
    ///
    /// The returned iterator is lazy; calling this again with the same
    /// arguments yields the same sequence.
    pub fn occurrences_in_range<'a>(
        &self,
        pattern: &'a RecurrencePattern,
        start: NaiveDateTime,
        end: NaiveDateTime,
        max_count: usize,
    ) -> Occurrences<'a> {
        let remaining = pattern
            .max_occurrences()
            .map_or(max_count, |cap| max_count.min(cap as usize));
        Occurrences {
            calculator: *self,
            pattern,
            cursor: start,
            end,
            remaining,
            produced: 0,
            finished: false,
        }
    }

    fn next_monthly(
        &self,
        pattern: &RecurrencePattern,
        rule: &MonthlyRule,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        match rule {
            MonthlyRule::DayOfMonth { day } => self.next_monthly_by_date(pattern, *day, after),
            MonthlyRule::WeekdayOfMonth { weekday, week } => {
                self.next_monthly_by_weekday(pattern, *weekday, *week, after)
            }
            MonthlyRule::LastDay => next_monthly_last_day(pattern, after),
            MonthlyRule::LastWeekday { weekday } => {
                self.next_monthly_by_weekday(pattern, *weekday, -1, after)
            }
        }
    }

    fn next_monthly_by_date(
        &self,
        pattern: &RecurrencePattern,
        day: u32,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let times = pattern.times_of_day();

        // This month keeps `after`'s wall-clock time.
        if let Some(candidate) = after.with_day(day) {
            if candidate > after {
                return Some(apply_times_of_day(candidate, after, times));
            }
        }

        // Later months start at midnight; months without `day` are skipped.
        let (mut year, mut month) = (after.year(), after.month());
        for _ in 0..self.limits.max_month_steps {
            (year, month) = add_months(year, month, pattern.interval())?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(apply_times_of_day(
                    date.and_time(NaiveTime::MIN),
                    after,
                    times,
                ));
            }
        }

        debug!(
            day,
            interval = pattern.interval(),
            steps = self.limits.max_month_steps,
            "no month containing the target day within search horizon"
        );
        None
    }

    fn next_monthly_by_weekday(
        &self,
        pattern: &RecurrencePattern,
        weekday: Weekday,
        week: i32,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let times = pattern.times_of_day();
        let place = |date: NaiveDate| apply_times_of_day(date.and_time(after.time()), after, times);

        let (mut year, mut month) = (after.year(), after.month());
        if let Some(date) = nth_weekday_of_month(year, month, weekday, week) {
            if date > after.date() {
                return Some(place(date));
            }
        }

        for _ in 0..self.limits.max_month_steps {
            (year, month) = add_months(year, month, pattern.interval())?;
            if let Some(date) = nth_weekday_of_month(year, month, weekday, week) {
                return Some(place(date));
            }
        }

        debug!(
            %weekday,
            week,
            interval = pattern.interval(),
            steps = self.limits.max_month_steps,
            "no month containing the weekday ordinal within search horizon"
        );
        None
    }
}

// ── Free functions ──────────────────────────────────────────────────────────

/// The earliest occurrence of `pattern` strictly after `after`, using the
/// default [`CalculatorLimits`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use recurrence_engine::{next_occurrence, RecurrencePattern};
///
/// // Mon/Wed/Fri, asked on Tuesday 2025-10-14 at noon
/// let pattern = RecurrencePattern::weekly(&[0, 2, 4], 1).unwrap();
/// let after = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap().and_hms_opt(12, 0, 0).unwrap();
///
/// let next = next_occurrence(&pattern, after).unwrap();
/// assert_eq!(next.to_string(), "2025-10-15 12:00:00");
/// ```
pub fn next_occurrence(pattern: &RecurrencePattern, after: NaiveDateTime) -> Option<NaiveDateTime> {
    RecurrenceCalculator::default().next_occurrence(pattern, after)
}

/// Occurrences of `pattern` from `start` up to `end`, at most `max_count`,
/// using the default [`CalculatorLimits`].
///
/// See [`RecurrenceCalculator::occurrences_in_range`] for the walk rules.
pub fn occurrences_in_range(
    pattern: &RecurrencePattern,
    start: NaiveDateTime,
    end: NaiveDateTime,
    max_count: usize,
) -> Occurrences<'_> {
    RecurrenceCalculator::default().occurrences_in_range(pattern, start, end, max_count)
}

// ── Occurrences ─────────────────────────────────────────────────────────────

/// Lazy iterator returned by [`occurrences_in_range`].
///
/// Cloning it before consumption restarts the walk from the same point.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    calculator: RecurrenceCalculator,
    pattern: &'a RecurrencePattern,
    cursor: NaiveDateTime,
    end: NaiveDateTime,
    remaining: usize,
    produced: usize,
    finished: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        if self.finished || self.cursor >= self.end || self.remaining == 0 {
            self.finished = true;
            return None;
        }
        if self.produced >= self.calculator.limits.max_iterations {
            debug!(
                limit = self.calculator.limits.max_iterations,
                "range walk stopped at iteration limit"
            );
            self.finished = true;
            return None;
        }

        let Some(occurrence) = self
            .calculator
            .next_occurrence(self.pattern, self.cursor)
            .filter(|o| *o <= self.end)
        else {
            self.finished = true;
            return None;
        };

        self.remaining -= 1;
        self.produced += 1;

        let step = if self.pattern.times_of_day().len() > 1 {
            Duration::minutes(1)
        } else {
            Duration::days(1)
        };
        match occurrence.checked_add_signed(step) {
            Some(cursor) => self.cursor = cursor,
            None => self.finished = true,
        }

        Some(occurrence)
    }
}

impl FusedIterator for Occurrences<'_> {}

// ── Per-kind algorithms ─────────────────────────────────────────────────────

fn next_daily(pattern: &RecurrencePattern, after: NaiveDateTime) -> Option<NaiveDateTime> {
    let step = Duration::days(i64::from(pattern.interval()));
    let times = pattern.times_of_day();

    if times.is_empty() {
        return after.checked_add_signed(step);
    }

    later_same_day(after.date(), after, times).or_else(|| {
        let date = after.date().checked_add_signed(step)?;
        Some(apply_times_of_day(date.and_time(NaiveTime::MIN), after, times))
    })
}

fn next_weekly(
    pattern: &RecurrencePattern,
    weekdays: &[Weekday],
    after: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let current = i64::from(weekday_ordinal(after.weekday()));
    let ordinals = weekdays.iter().map(|d| i64::from(weekday_ordinal(*d)));

    let days_ahead = match ordinals.clone().filter(|d| *d > current).min() {
        Some(later_this_week) => later_this_week - current,
        // Wraps to the day before the smallest weekday of the interval-th
        // following week.
        None => 7 * i64::from(pattern.interval()) - current - 1 + ordinals.min()?,
    };

    let times = pattern.times_of_day();
    let candidate = after.checked_add_signed(Duration::days(days_ahead))?;
    let next = apply_times_of_day(candidate, after, times);
    if next > after {
        return Some(next);
    }

    // A zero-day wrap (Sunday against a Monday rule) with no later time today
    // would land on or before `after`; take the weekday itself instead.
    let candidate = candidate.checked_add_signed(Duration::days(1))?;
    Some(apply_times_of_day(candidate, after, times))
}

fn next_monthly_last_day(pattern: &RecurrencePattern, after: NaiveDateTime) -> Option<NaiveDateTime> {
    let times = pattern.times_of_day();

    let this_month = last_day_of_month(after.year(), after.month())?.and_time(after.time());
    if this_month > after {
        return Some(apply_times_of_day(this_month, after, times));
    }

    let (year, month) = add_months(after.year(), after.month(), pattern.interval())?;
    let date = last_day_of_month(year, month)?;
    Some(apply_times_of_day(date.and_time(NaiveTime::MIN), after, times))
}

fn next_yearly(
    pattern: &RecurrencePattern,
    month: u32,
    day: u32,
    after: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let times = pattern.times_of_day();

    // Exact date only in the current year; a missing Feb 29 moves on.
    if let Some(date) = NaiveDate::from_ymd_opt(after.year(), month, day) {
        let candidate = date.and_time(NaiveTime::MIN);
        if candidate > after {
            return Some(apply_times_of_day(candidate, after, times));
        }
    }

    let year = after
        .year()
        .checked_add(i32::try_from(pattern.interval()).ok()?)?;
    // Missing in the advanced year: the 28th, for this occurrence only.
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 28))?;
    Some(apply_times_of_day(date.and_time(NaiveTime::MIN), after, times))
}

// ── Times of day ────────────────────────────────────────────────────────────

/// First configured time on `date`, in list order, that is strictly after
/// `after`. Only `after`'s own date qualifies.
fn later_same_day(
    date: NaiveDate,
    after: NaiveDateTime,
    times: &[TimeOfDay],
) -> Option<NaiveDateTime> {
    if date != after.date() {
        return None;
    }
    times
        .iter()
        .map(|t| date.and_time(t.as_naive_time()))
        .find(|candidate| *candidate > after)
}

/// Layer the configured times of day onto a candidate date.
///
/// With no times configured the candidate is returned unchanged. Otherwise a
/// later time on `after`'s own date wins, and any other date gets the first
/// listed time.
fn apply_times_of_day(
    candidate: NaiveDateTime,
    after: NaiveDateTime,
    times: &[TimeOfDay],
) -> NaiveDateTime {
    let Some(first) = times.first() else {
        return candidate;
    };
    let date = candidate.date();
    later_same_day(date, after, times).unwrap_or_else(|| date.and_time(first.as_naive_time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    /// Tuesday, 2025-10-14 12:00.
    fn base() -> NaiveDateTime {
        at(2025, 10, 14, 12, 0)
    }

    fn with_times(pattern: RecurrencePattern, times: &[&str]) -> RecurrencePattern {
        pattern.with_times_of_day(times).unwrap()
    }

    // ── daily ───────────────────────────────────────────────────────────

    #[test]
    fn test_daily_steps_one_day() {
        let p = RecurrencePattern::daily(1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 12, 0)));
    }

    #[test]
    fn test_daily_interval_keeps_exact_time() {
        let p = RecurrencePattern::daily(3).unwrap();
        let after = base() + Duration::seconds(56) + Duration::minutes(34);
        assert_eq!(next_occurrence(&p, after), Some(after + Duration::days(3)));
    }

    #[test]
    fn test_daily_time_later_today() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["15:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 14, 15, 0)));
    }

    #[test]
    fn test_daily_time_already_passed() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["08:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 8, 0)));
    }

    #[test]
    fn test_daily_time_equal_to_after_is_not_later() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["12:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 12, 0)));
    }

    #[test]
    fn test_daily_multiple_times_picks_next_today() {
        let p = with_times(
            RecurrencePattern::daily(1).unwrap(),
            &["08:00", "15:00", "20:00"],
        );
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 14, 15, 0)));
    }

    #[test]
    fn test_daily_unsorted_times_use_list_order() {
        // 21:00 is listed first, so it wins over the earlier 13:00.
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["21:00", "13:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 14, 21, 0)));

        // Past every time today: the first listed time on the next date.
        let late = at(2025, 10, 14, 22, 0);
        assert_eq!(next_occurrence(&p, late), Some(at(2025, 10, 15, 21, 0)));
    }

    #[test]
    fn test_daily_interval_still_fires_later_today() {
        // Same-day times are checked against `after`'s date even when the
        // interval is larger than one day.
        let p = with_times(RecurrencePattern::daily(2).unwrap(), &["15:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 14, 15, 0)));

        let p = with_times(RecurrencePattern::daily(2).unwrap(), &["08:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 16, 8, 0)));
    }

    // ── weekly ──────────────────────────────────────────────────────────

    #[test]
    fn test_weekly_later_this_week() {
        let p = RecurrencePattern::weekly(&[4], 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 17, 12, 0)));
    }

    #[test]
    fn test_weekly_wrap_lands_day_before_weekday() {
        // Known quirk: the wrap offset is 7·interval − cw − 1 + min(weekdays),
        // so a Monday rule asked on Tuesday lands on the following Sunday.
        let p = RecurrencePattern::weekly(&[0], 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 19, 12, 0)));
    }

    #[test]
    fn test_weekly_picks_nearest_of_several() {
        let p = RecurrencePattern::weekly(&[0, 2, 4], 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 12, 0)));
    }

    #[test]
    fn test_weekly_unsorted_weekdays() {
        let p = RecurrencePattern::weekly(&[4, 2], 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 12, 0)));
    }

    #[test]
    fn test_weekly_interval_two_wrap_quirk() {
        // Every other Tuesday, asked on a Tuesday: thirteen days out, the
        // Monday before the target week's Tuesday.
        let p = RecurrencePattern::weekly(&[1], 2).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 27, 12, 0)));
    }

    #[test]
    fn test_weekly_from_sunday_moves_forward() {
        // A Monday rule asked on Sunday wraps zero days; the result must still
        // be strictly later, so it steps onto the Monday.
        let sunday = at(2025, 10, 19, 12, 0);
        let p = RecurrencePattern::weekly(&[0], 1).unwrap();
        assert_eq!(next_occurrence(&p, sunday), Some(at(2025, 10, 20, 12, 0)));

        // Known quirk: a Sunday rule asked on Sunday lands on Saturday.
        let p = RecurrencePattern::weekly(&[6], 1).unwrap();
        assert_eq!(next_occurrence(&p, sunday), Some(at(2025, 10, 25, 12, 0)));
    }

    #[test]
    fn test_weekly_zero_day_wrap_uses_later_time_today() {
        let p = with_times(RecurrencePattern::weekly(&[0], 1).unwrap(), &["09:00"]);
        // The wrapped date is `after`'s own date and 09:00 is still ahead.
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 19, 8, 0)),
            Some(at(2025, 10, 19, 9, 0))
        );
        // 09:00 has passed: the Monday at 09:00.
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 19, 10, 0)),
            Some(at(2025, 10, 20, 9, 0))
        );
    }

    #[test]
    fn test_weekly_with_time_same_weekday_wraps() {
        // Tuesday at 09:00, asked Tuesday 08:00: weekdays must be strictly
        // later, and the wrap quirk lands on Monday.
        let p = with_times(RecurrencePattern::weekly(&[1], 1).unwrap(), &["09:00"]);
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 14, 8, 0)),
            Some(at(2025, 10, 20, 9, 0))
        );
    }

    #[test]
    fn test_weekly_with_time_applies_first_time() {
        let p = with_times(RecurrencePattern::weekly(&[0, 2, 4], 1).unwrap(), &["09:30"]);
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 14, 8, 0)),
            Some(at(2025, 10, 15, 9, 30))
        );
    }

    #[test]
    fn test_weekly_empty_weekdays_is_none() {
        let p = RecurrencePattern::weekly(&[], 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), None);
    }

    // ── monthly by date ─────────────────────────────────────────────────

    #[test]
    fn test_monthly_by_date_this_month_keeps_time() {
        let p = RecurrencePattern::monthly_by_date(20, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 20, 12, 0)));
    }

    #[test]
    fn test_monthly_by_date_next_month_at_midnight() {
        let p = RecurrencePattern::monthly_by_date(10, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 11, 10, 0, 0)));
    }

    #[test]
    fn test_monthly_by_date_interval() {
        let p = RecurrencePattern::monthly_by_date(15, 3).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 15, 12, 0)));

        let p = RecurrencePattern::monthly_by_date(10, 3).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2026, 1, 10, 0, 0)));
    }

    #[test]
    fn test_monthly_by_date_skips_short_months() {
        let p = RecurrencePattern::monthly_by_date(31, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2025, 1, 15, 0, 0)),
            Some(at(2025, 1, 31, 0, 0))
        );
        assert_eq!(
            next_occurrence(&p, at(2025, 1, 31, 0, 1)),
            Some(at(2025, 3, 31, 0, 0))
        );
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 31, 12, 1)),
            Some(at(2025, 12, 31, 0, 0))
        );
    }

    #[test]
    fn test_monthly_by_date_never_matching_terminates() {
        // Every twelve months from February never reaches a 30th.
        let p = RecurrencePattern::monthly_by_date(30, 12).unwrap();
        assert_eq!(next_occurrence(&p, at(2025, 2, 10, 0, 0)), None);
    }

    #[test]
    fn test_monthly_by_date_with_time() {
        let p = with_times(RecurrencePattern::monthly_by_date(1, 1).unwrap(), &["09:00"]);
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 15, 12, 0)),
            Some(at(2025, 11, 1, 9, 0))
        );
    }

    // ── monthly by weekday ──────────────────────────────────────────────

    #[test]
    fn test_first_monday_next_month() {
        let p = RecurrencePattern::monthly_by_weekday(0, 1, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 11, 3, 12, 0)));
    }

    #[test]
    fn test_last_friday_this_month() {
        let p = RecurrencePattern::monthly_by_weekday(4, -1, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 31, 12, 0)));
    }

    #[test]
    fn test_fifth_monday_searches_forward() {
        // No fifth Monday in October or November 2025; December has one.
        let p = RecurrencePattern::monthly_by_weekday(0, 5, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 12, 29, 12, 0)));
    }

    #[test]
    fn test_fifth_from_last_wednesday() {
        let p = RecurrencePattern::monthly_by_weekday(2, -5, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2025, 9, 15, 12, 0)),
            Some(at(2025, 10, 1, 12, 0))
        );
    }

    #[test]
    fn test_monthly_by_weekday_on_the_day_moves_on() {
        // Dates are compared, so a later time on the matching day does not count.
        let p = with_times(
            RecurrencePattern::monthly_by_weekday(0, 1, 1).unwrap(),
            &["09:00"],
        );
        assert_eq!(
            next_occurrence(&p, at(2025, 11, 3, 8, 0)),
            Some(at(2025, 12, 1, 9, 0))
        );
    }

    #[test]
    fn test_monthly_by_weekday_interval() {
        let p = RecurrencePattern::monthly_by_weekday(0, 1, 2).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 12, 1, 12, 0)));
    }

    #[test]
    fn test_monthly_search_respects_horizon() {
        let calc = RecurrenceCalculator::with_limits(CalculatorLimits {
            max_month_steps: 0,
            ..CalculatorLimits::default()
        });
        let p = RecurrencePattern::monthly_by_weekday(0, 1, 1).unwrap();
        assert_eq!(calc.next_occurrence(&p, base()), None);
    }

    // ── monthly last day / last weekday ─────────────────────────────────

    #[test]
    fn test_last_day_this_month() {
        let p = RecurrencePattern::monthly_last_day(1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 10, 31, 12, 0)));
    }

    #[test]
    fn test_last_day_rolls_over() {
        let p = RecurrencePattern::monthly_last_day(1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 31, 12, 0)),
            Some(at(2025, 11, 30, 0, 0))
        );
        assert_eq!(
            next_occurrence(&p, at(2024, 1, 31, 12, 0)),
            Some(at(2024, 2, 29, 0, 0))
        );
    }

    #[test]
    fn test_last_day_interval_crosses_year() {
        let p = RecurrencePattern::monthly_last_day(3).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 31, 13, 0)),
            Some(at(2026, 1, 31, 0, 0))
        );
    }

    #[test]
    fn test_last_weekday_matches_minus_one_ordinal() {
        let last = RecurrencePattern::monthly_last_weekday(4, 1).unwrap();
        let ordinal = RecurrencePattern::monthly_by_weekday(4, -1, 1).unwrap();
        let after = at(2025, 10, 31, 12, 0);
        assert_eq!(next_occurrence(&last, after), Some(at(2025, 11, 28, 12, 0)));
        assert_eq!(next_occurrence(&last, after), next_occurrence(&ordinal, after));
    }

    // ── yearly ──────────────────────────────────────────────────────────

    #[test]
    fn test_yearly_this_year() {
        let p = RecurrencePattern::yearly(12, 25, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2025, 12, 25, 0, 0)));
    }

    #[test]
    fn test_yearly_next_year() {
        let p = RecurrencePattern::yearly(3, 15, 1).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2026, 3, 15, 0, 0)));
    }

    #[test]
    fn test_yearly_interval() {
        let p = RecurrencePattern::yearly(7, 4, 5).unwrap();
        assert_eq!(next_occurrence(&p, base()), Some(at(2030, 7, 4, 0, 0)));
    }

    #[test]
    fn test_yearly_leap_day_in_leap_year() {
        let p = RecurrencePattern::yearly(2, 29, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2024, 1, 1, 12, 0)),
            Some(at(2024, 2, 29, 0, 0))
        );
    }

    #[test]
    fn test_yearly_leap_day_falls_back_to_28th() {
        let p = RecurrencePattern::yearly(2, 29, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2024, 2, 29, 12, 1)),
            Some(at(2025, 2, 28, 0, 0))
        );
        // Not a leap year now either: skip to next year, the 28th again.
        assert_eq!(
            next_occurrence(&p, at(2025, 1, 1, 0, 0)),
            Some(at(2026, 2, 28, 0, 0))
        );
    }

    #[test]
    fn test_yearly_leap_day_every_four_years() {
        let p = RecurrencePattern::yearly(2, 29, 4).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2024, 3, 1, 0, 0)),
            Some(at(2028, 2, 29, 0, 0))
        );
    }

    #[test]
    fn test_yearly_missing_day_falls_back_to_28th() {
        let p = RecurrencePattern::yearly(4, 31, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2025, 5, 1, 0, 0)),
            Some(at(2026, 4, 28, 0, 0))
        );

        // Not the 29th, even in a leap year.
        let p = RecurrencePattern::yearly(2, 30, 1).unwrap();
        assert_eq!(
            next_occurrence(&p, at(2027, 3, 1, 0, 0)),
            Some(at(2028, 2, 28, 0, 0))
        );
    }

    #[test]
    fn test_yearly_with_time() {
        let p = with_times(RecurrencePattern::yearly(3, 15, 1).unwrap(), &["09:00"]);
        assert_eq!(next_occurrence(&p, base()), Some(at(2026, 3, 15, 9, 0)));
    }

    #[test]
    fn test_yearly_on_the_day_waits_a_year() {
        // The current-year candidate is midnight, already behind 08:00.
        let p = with_times(RecurrencePattern::yearly(10, 14, 1).unwrap(), &["09:00"]);
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 14, 8, 0)),
            Some(at(2026, 10, 14, 9, 0))
        );
    }

    // ── end date ────────────────────────────────────────────────────────

    #[test]
    fn test_after_past_end_date_is_none() {
        let p = RecurrencePattern::daily(1)
            .unwrap()
            .with_end_date(at(2025, 10, 15, 0, 0));
        assert_eq!(next_occurrence(&p, at(2025, 10, 16, 0, 0)), None);
        assert_eq!(next_occurrence(&p, at(2025, 10, 15, 0, 0)), None);
    }

    #[test]
    fn test_occurrence_at_end_date_is_none() {
        let p = RecurrencePattern::daily(1)
            .unwrap()
            .with_end_date(at(2025, 10, 15, 12, 0));
        assert_eq!(next_occurrence(&p, base()), None);
        assert_eq!(
            next_occurrence(&p, at(2025, 10, 14, 11, 0)),
            Some(at(2025, 10, 15, 11, 0))
        );
    }

    // ── overflow ────────────────────────────────────────────────────────

    #[test]
    fn test_huge_intervals_do_not_panic() {
        let after = base();
        for p in [
            RecurrencePattern::daily(u32::MAX).unwrap(),
            RecurrencePattern::weekly(&[0], u32::MAX).unwrap(),
            RecurrencePattern::monthly_by_date(10, u32::MAX).unwrap(),
            RecurrencePattern::monthly_last_day(u32::MAX).unwrap(),
            RecurrencePattern::yearly(3, 15, u32::MAX).unwrap(),
        ] {
            assert_eq!(next_occurrence(&p, after), None, "{p:?}");
        }
    }

    // ── range ───────────────────────────────────────────────────────────

    #[test]
    fn test_range_two_times_a_day() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["09:00", "21:00"]);
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 10, 14, 8, 0), at(2025, 10, 16, 8, 0), 100)
                .collect();
        assert_eq!(
            got,
            vec![
                at(2025, 10, 14, 9, 0),
                at(2025, 10, 14, 21, 0),
                at(2025, 10, 15, 9, 0),
                at(2025, 10, 15, 21, 0),
            ]
        );
    }

    #[test]
    fn test_range_respects_max_count() {
        let p = RecurrencePattern::daily(1).unwrap();
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 10, 1, 0, 0), at(2025, 10, 31, 0, 0), 5).collect();
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn test_range_single_time_cursor_advances_a_day() {
        // The cursor moves a full day past each hit, so a single-time daily
        // pattern lands on every other day.
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["09:00"]);
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 10, 14, 8, 0), at(2025, 10, 20, 0, 0), 100)
                .collect();
        assert_eq!(
            got,
            vec![
                at(2025, 10, 14, 9, 0),
                at(2025, 10, 16, 9, 0),
                at(2025, 10, 18, 9, 0),
            ]
        );
    }

    #[test]
    fn test_range_includes_occurrence_equal_to_end() {
        let p = RecurrencePattern::weekly(&[0, 2, 4], 1).unwrap();
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 10, 13, 0, 0), at(2025, 10, 24, 0, 0), 100)
                .collect();
        // Saturday's cursor wraps onto Sunday 10-19.
        assert_eq!(
            got,
            vec![
                at(2025, 10, 15, 0, 0),
                at(2025, 10, 17, 0, 0),
                at(2025, 10, 19, 0, 0),
                at(2025, 10, 22, 0, 0),
                at(2025, 10, 24, 0, 0),
            ]
        );
    }

    #[test]
    fn test_range_monthly() {
        let p = RecurrencePattern::monthly_by_date(15, 1).unwrap();
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 1, 1, 0, 0), at(2025, 6, 1, 0, 0), 100).collect();
        assert_eq!(
            got,
            vec![
                at(2025, 1, 15, 0, 0),
                at(2025, 2, 15, 0, 0),
                at(2025, 3, 15, 0, 0),
                at(2025, 4, 15, 0, 0),
                at(2025, 5, 15, 0, 0),
            ]
        );
    }

    #[test]
    fn test_range_pattern_max_occurrences() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["09:00", "21:00"])
            .with_max_occurrences(3)
            .unwrap();
        let got: Vec<_> =
            occurrences_in_range(&p, at(2025, 1, 1, 0, 0), at(2026, 1, 1, 0, 0), 100).collect();
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn test_range_empty_window() {
        let p = RecurrencePattern::daily(1).unwrap();
        assert_eq!(occurrences_in_range(&p, base(), base(), 10).count(), 0);
        assert_eq!(
            occurrences_in_range(&p, base(), base() - Duration::days(1), 10).count(),
            0
        );
    }

    #[test]
    fn test_range_zero_max_count() {
        let p = RecurrencePattern::daily(1).unwrap();
        assert_eq!(
            occurrences_in_range(&p, base(), base() + Duration::days(10), 0).count(),
            0
        );
    }

    #[test]
    fn test_range_iteration_limit() {
        let calc = RecurrenceCalculator::with_limits(CalculatorLimits {
            max_iterations: 10,
            ..CalculatorLimits::default()
        });
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["09:00", "21:00"]);
        let got: Vec<_> = calc
            .occurrences_in_range(&p, at(2025, 1, 1, 0, 0), at(2026, 1, 1, 0, 0), usize::MAX)
            .collect();
        assert_eq!(got.len(), 10);
    }

    #[test]
    fn test_range_default_iteration_limit() {
        let p = with_times(RecurrencePattern::daily(1).unwrap(), &["09:00", "21:00"]);
        let count =
            occurrences_in_range(&p, at(2025, 1, 1, 0, 0), at(2030, 1, 1, 0, 0), usize::MAX)
                .count();
        assert_eq!(count, 1000);
    }

    #[test]
    fn test_range_is_restartable() {
        let p = RecurrencePattern::weekly(&[0, 3], 1).unwrap();
        let walk = occurrences_in_range(&p, base(), base() + Duration::days(60), 100);
        let first: Vec<_> = walk.clone().collect();
        let second: Vec<_> = walk.collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_range_weekly_empty_is_empty() {
        let p = RecurrencePattern::weekly(&[], 1).unwrap();
        assert_eq!(
            occurrences_in_range(&p, base(), base() + Duration::days(60), 100).count(),
            0
        );
    }

    #[test]
    fn test_range_is_fused() {
        let p = RecurrencePattern::daily(1).unwrap();
        let mut walk = occurrences_in_range(&p, base(), base() + Duration::days(1), 100);
        assert_eq!(walk.next(), Some(at(2025, 10, 15, 12, 0)));
        assert_eq!(walk.next(), None);
        assert_eq!(walk.next(), None);
    }
}
