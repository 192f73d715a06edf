//! Calendar arithmetic shared by the pattern model and the calculator.
//!
//! All helpers are total: dates that cannot be represented (day 31 in a
//! 30-day month, years outside chrono's range) come back as `None` rather
//! than panicking.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::ValidationError;

/// Map a Monday-based ordinal (Monday = 0 … Sunday = 6) to a [`Weekday`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidWeekday`] for any value outside `0..=6`.
pub fn weekday_from_ordinal(ordinal: i64) -> Result<Weekday, ValidationError> {
    match ordinal {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(ValidationError::InvalidWeekday(other)),
    }
}

/// The Monday-based ordinal of a [`Weekday`] (Monday = 0 … Sunday = 6).
pub fn weekday_ordinal(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

/// Step `months` months forward from `(year, month)`, wrapping December into
/// January of the following year.
pub fn add_months(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    let zero_based = i64::from(month) - 1 + i64::from(months);
    let year = i64::from(year) + zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    i32::try_from(year).ok().map(|y| (y, month))
}

/// Last calendar day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = add_months(year, month, 1)?;
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// Number of days in the given month (28..=31).
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    last_day_of_month(year, month).map(|d| d.day())
}

/// Find the Nth `weekday` in a month.
///
/// Positive ordinals count from the start of the month (`1` = first), negative
/// ordinals from the end (`-1` = last, `-2` = second to last). Returns `None`
/// when the month has no such occurrence (e.g. a fifth Monday) or the ordinal
/// is zero.
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: i32,
) -> Option<NaiveDate> {
    if ordinal > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let diff = (i64::from(weekday_ordinal(weekday))
            - i64::from(weekday_ordinal(first.weekday()))
            + 7)
            % 7;
        let first_occurrence = first + Duration::days(diff);
        let target = first_occurrence + Duration::weeks(i64::from(ordinal) - 1);
        (target.month() == month).then_some(target)
    } else if ordinal < 0 {
        let last = last_day_of_month(year, month)?;
        let diff = (i64::from(weekday_ordinal(last.weekday()))
            - i64::from(weekday_ordinal(weekday))
            + 7)
            % 7;
        let last_occurrence = last - Duration::days(diff);
        let target = last_occurrence - Duration::weeks(-i64::from(ordinal) - 1);
        (target.month() == month).then_some(target)
    } else {
        None
    }
}
