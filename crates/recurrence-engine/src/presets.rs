//! Named shortcuts for common patterns.
//!
//! Each function is sugar over a [`RecurrencePattern`] builder followed by
//! [`RecurrencePattern::with_times_of_day`]. Pass an empty slice for `times`
//! to leave occurrences at the calculator's natural time.

use crate::error::Result;
use crate::pattern::RecurrencePattern;

fn at(pattern: Result<RecurrencePattern>, times: &[&str]) -> Result<RecurrencePattern> {
    pattern?.with_times_of_day(times)
}

pub fn every_day(times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::daily(1), times)
}

pub fn every_n_days(n: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::daily(n), times)
}

/// Monday through Friday.
pub fn weekdays_only(times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::weekly(&[0, 1, 2, 3, 4], 1), times)
}

/// Saturday and Sunday.
pub fn weekends_only(times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::weekly(&[5, 6], 1), times)
}

/// Any set of weekdays (0 = Monday … 6 = Sunday), every week.
pub fn specific_weekdays(days: &[u32], times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::weekly(days, 1), times)
}

pub fn monthly_on_date(day: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::monthly_by_date(day, 1), times)
}

pub fn every_n_months_on_date(n: u32, day: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::monthly_by_date(day, n), times)
}

pub fn first_weekday_of_month(weekday: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::monthly_by_weekday(weekday, 1, 1), times)
}

/// Last occurrence of `weekday` in each month (e.g. the last Friday).
pub fn last_weekday_of_month(weekday: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::monthly_last_weekday(weekday, 1), times)
}

pub fn last_day_of_month(times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::monthly_last_day(1), times)
}

pub fn yearly_on_date(month: u32, day: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::yearly(month, day, 1), times)
}

pub fn every_n_years(n: u32, month: u32, day: u32, times: &[&str]) -> Result<RecurrencePattern> {
    at(RecurrencePattern::yearly(month, day, n), times)
}
