//! Validated, immutable recurrence rules.
//!
//! A [`RecurrencePattern`] is built once through a fallible constructor and
//! never mutated afterwards. Every invariant is checked at construction time,
//! so the calculator can treat any pattern it receives as well-formed.
//!
//! # Shapes
//!
//! - [`Rule::Daily`]: every N days
//! - [`Rule::Weekly`]: on a set of weekdays, every N weeks
//! - [`Rule::Monthly`]: by day of month, by nth weekday, on the last day, or
//!   on the last given weekday, every N months
//! - [`Rule::Yearly`]: on a month/day, every N years
//!
//! Any shape may carry a list of [`TimeOfDay`] values that pin occurrences to
//! specific wall-clock times.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::weekday_from_ordinal;
use crate::error::{Result, ValidationError};
use crate::record::PatternRecord;

// ── TimeOfDay ───────────────────────────────────────────────────────────────

/// A wall-clock time (hour and minute, seconds always zero).
///
/// Parses from and displays as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build a time of day from an hour (0-23) and minute (0-59).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeOfDay`] if either component is
    /// out of range.
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(TimeOfDay)
            .ok_or_else(|| ValidationError::InvalidTimeOfDay(format!("{hour:02}:{minute:02}")))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ValidationError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;

        let is_component = |part: &str| {
            (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !is_component(h) || m.len() != 2 || !is_component(m) {
            return Err(invalid());
        }

        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(TimeOfDay)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

// ── Discriminators ──────────────────────────────────────────────────────────

/// The unit a pattern's interval counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            "custom" => Err(ValidationError::UnsupportedKind(s.to_string())),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a monthly pattern picks its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonthlyMode {
    /// A fixed calendar day, e.g. the 15th.
    #[default]
    ByDayOfMonth,
    /// The nth weekday counted from either end, e.g. the first Monday.
    ByWeekdayOfMonth,
    /// The last calendar day.
    LastDay,
    /// The last given weekday, e.g. the last Friday.
    LastWeekday,
}

impl MonthlyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthlyMode::ByDayOfMonth => "day_of_month",
            MonthlyMode::ByWeekdayOfMonth => "weekday_of_month",
            MonthlyMode::LastDay => "last_day",
            MonthlyMode::LastWeekday => "last_weekday",
        }
    }
}

impl FromStr for MonthlyMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day_of_month" => Ok(MonthlyMode::ByDayOfMonth),
            "weekday_of_month" => Ok(MonthlyMode::ByWeekdayOfMonth),
            "last_day" => Ok(MonthlyMode::LastDay),
            "last_weekday" => Ok(MonthlyMode::LastWeekday),
            other => Err(ValidationError::UnknownMonthlyMode(other.to_string())),
        }
    }
}

// ── Rule ────────────────────────────────────────────────────────────────────

/// The date-selection part of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Daily,
    /// Weekdays in the caller's order; duplicates are harmless.
    Weekly { weekdays: Vec<Weekday> },
    Monthly(MonthlyRule),
    /// `day` may not exist in every year (Feb 29); see the calculator for
    /// how such years are handled.
    Yearly { month: u32, day: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlyRule {
    DayOfMonth { day: u32 },
    /// `week` is 1..=5 counting from the start or -5..=-1 counting from the end.
    WeekdayOfMonth { weekday: Weekday, week: i32 },
    LastDay,
    LastWeekday { weekday: Weekday },
}

impl MonthlyRule {
    pub fn mode(&self) -> MonthlyMode {
        match self {
            MonthlyRule::DayOfMonth { .. } => MonthlyMode::ByDayOfMonth,
            MonthlyRule::WeekdayOfMonth { .. } => MonthlyMode::ByWeekdayOfMonth,
            MonthlyRule::LastDay => MonthlyMode::LastDay,
            MonthlyRule::LastWeekday { .. } => MonthlyMode::LastWeekday,
        }
    }
}

impl Rule {
    pub fn frequency(&self) -> Frequency {
        match self {
            Rule::Daily => Frequency::Daily,
            Rule::Weekly { .. } => Frequency::Weekly,
            Rule::Monthly(_) => Frequency::Monthly,
            Rule::Yearly { .. } => Frequency::Yearly,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Rule::Daily | Rule::Weekly { .. } => Ok(()),
            Rule::Monthly(MonthlyRule::DayOfMonth { day }) => check_day_of_month(i64::from(*day)),
            Rule::Monthly(MonthlyRule::WeekdayOfMonth { week, .. }) => {
                check_week_of_month(i64::from(*week))
            }
            Rule::Monthly(MonthlyRule::LastDay | MonthlyRule::LastWeekday { .. }) => Ok(()),
            Rule::Yearly { month, day } => {
                check_month_of_year(i64::from(*month))?;
                check_day_of_month(i64::from(*day))
            }
        }
    }
}

pub(crate) fn check_interval(interval: i64) -> Result<u32> {
    u32::try_from(interval)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or(ValidationError::InvalidInterval(interval))
}

pub(crate) fn check_day_of_month(day: i64) -> Result<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDayOfMonth(day))
    }
}

pub(crate) fn check_month_of_year(month: i64) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::InvalidMonthOfYear(month))
    }
}

pub(crate) fn check_week_of_month(week: i64) -> Result<()> {
    if (-5..=5).contains(&week) && week != 0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidWeekOfMonth(week))
    }
}

// ── RecurrencePattern ───────────────────────────────────────────────────────

/// A validated recurrence rule.
///
/// Serializes through [`PatternRecord`]; deserialization re-runs every
/// construction check.
///
/// # Examples
///
/// ```
/// use recurrence_engine::RecurrencePattern;
///
/// // Mon/Wed/Fri at 09:30
/// let pattern = RecurrencePattern::weekly(&[0, 2, 4], 1)
///     .unwrap()
///     .with_times_of_day(["09:30"])
///     .unwrap();
/// assert_eq!(pattern.weekdays().len(), 3);
///
/// assert!(RecurrencePattern::weekly(&[7], 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatternRecord", into = "PatternRecord")]
pub struct RecurrencePattern {
    rule: Rule,
    interval: u32,
    times_of_day: Vec<TimeOfDay>,
    end_date: Option<NaiveDateTime>,
    max_occurrences: Option<u32>,
}

impl RecurrencePattern {
    /// Construct a pattern from a rule and an interval.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] variant naming the first violated
    /// invariant: interval below 1, day of month outside 1..=31, month
    /// outside 1..=12, or week of month outside -5..=5 / zero.
    pub fn new(rule: Rule, interval: u32) -> Result<Self> {
        let interval = check_interval(i64::from(interval))?;
        rule.validate()?;
        Ok(Self {
            rule,
            interval,
            times_of_day: Vec::new(),
            end_date: None,
            max_occurrences: None,
        })
    }

    /// Every `interval` days.
    pub fn daily(interval: u32) -> Result<Self> {
        Self::new(Rule::Daily, interval)
    }

    /// On the given weekdays (Monday = 0 … Sunday = 6), every `interval` weeks.
    pub fn weekly(weekdays: &[u32], interval: u32) -> Result<Self> {
        let weekdays = weekdays
            .iter()
            .map(|d| weekday_from_ordinal(i64::from(*d)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(Rule::Weekly { weekdays }, interval)
    }

    /// On a fixed day of the month, every `interval` months.
    pub fn monthly_by_date(day_of_month: u32, interval: u32) -> Result<Self> {
        Self::new(
            Rule::Monthly(MonthlyRule::DayOfMonth { day: day_of_month }),
            interval,
        )
    }

    /// On the nth weekday of the month (`week_of_month` 1..=5 or -5..=-1).
    pub fn monthly_by_weekday(weekday: u32, week_of_month: i32, interval: u32) -> Result<Self> {
        let weekday = weekday_from_ordinal(i64::from(weekday))?;
        Self::new(
            Rule::Monthly(MonthlyRule::WeekdayOfMonth {
                weekday,
                week: week_of_month,
            }),
            interval,
        )
    }

    /// On the last calendar day of the month.
    pub fn monthly_last_day(interval: u32) -> Result<Self> {
        Self::new(Rule::Monthly(MonthlyRule::LastDay), interval)
    }

    /// On the last given weekday of the month.
    pub fn monthly_last_weekday(weekday: u32, interval: u32) -> Result<Self> {
        let weekday = weekday_from_ordinal(i64::from(weekday))?;
        Self::new(Rule::Monthly(MonthlyRule::LastWeekday { weekday }), interval)
    }

    /// On `month`/`day`, every `interval` years.
    pub fn yearly(month: u32, day: u32, interval: u32) -> Result<Self> {
        Self::new(Rule::Yearly { month, day }, interval)
    }

    /// Pin occurrences to the given `"HH:MM"` times.
    ///
    /// Order matters: the calculator scans the list in the order given when
    /// looking for a later time on the same day, so callers should pass the
    /// times already sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeOfDay`] for the first string
    /// that is not a valid `"HH:MM"` time.
    pub fn with_times_of_day<I, S>(self, times: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let times = times
            .into_iter()
            .map(|t| t.as_ref().parse::<TimeOfDay>())
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_times(times))
    }

    /// Pin occurrences to already-parsed times.
    pub fn with_times(self, times_of_day: Vec<TimeOfDay>) -> Self {
        Self {
            times_of_day,
            ..self
        }
    }

    /// No occurrences at or after `end_date`.
    pub fn with_end_date(self, end_date: NaiveDateTime) -> Self {
        Self {
            end_date: Some(end_date),
            ..self
        }
    }

    /// Cap range enumeration at `max` occurrences.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMaxOccurrences`] when `max` is zero.
    pub fn with_max_occurrences(self, max: u32) -> Result<Self> {
        if max == 0 {
            return Err(ValidationError::InvalidMaxOccurrences(0));
        }
        Ok(Self {
            max_occurrences: Some(max),
            ..self
        })
    }

    pub(crate) fn from_parts(
        rule: Rule,
        interval: u32,
        times_of_day: Vec<TimeOfDay>,
        end_date: Option<NaiveDateTime>,
        max_occurrences: Option<u32>,
    ) -> Result<Self> {
        let pattern = Self::new(rule, interval)?.with_times(times_of_day);
        let pattern = match end_date {
            Some(end) => pattern.with_end_date(end),
            None => pattern,
        };
        match max_occurrences {
            Some(max) => pattern.with_max_occurrences(max),
            None => Ok(pattern),
        }
    }

    // ── accessors ───────────────────────────────────────────────────────

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn frequency(&self) -> Frequency {
        self.rule.frequency()
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn times_of_day(&self) -> &[TimeOfDay] {
        &self.times_of_day
    }

    pub fn end_date(&self) -> Option<NaiveDateTime> {
        self.end_date
    }

    pub fn max_occurrences(&self) -> Option<u32> {
        self.max_occurrences
    }

    /// Configured weekdays; empty for non-weekly patterns.
    pub fn weekdays(&self) -> &[Weekday] {
        match &self.rule {
            Rule::Weekly { weekdays } => weekdays,
            _ => &[],
        }
    }

    pub fn monthly_mode(&self) -> Option<MonthlyMode> {
        match &self.rule {
            Rule::Monthly(m) => Some(m.mode()),
            _ => None,
        }
    }

    pub fn day_of_month(&self) -> Option<u32> {
        match &self.rule {
            Rule::Monthly(MonthlyRule::DayOfMonth { day }) | Rule::Yearly { day, .. } => {
                Some(*day)
            }
            _ => None,
        }
    }

    pub fn month_of_year(&self) -> Option<u32> {
        match &self.rule {
            Rule::Yearly { month, .. } => Some(*month),
            _ => None,
        }
    }

    pub fn weekday(&self) -> Option<Weekday> {
        match &self.rule {
            Rule::Monthly(
                MonthlyRule::WeekdayOfMonth { weekday, .. } | MonthlyRule::LastWeekday { weekday },
            ) => Some(*weekday),
            _ => None,
        }
    }

    /// Signed week-of-month ordinal; `-1` for last-weekday patterns.
    pub fn week_of_month(&self) -> Option<i32> {
        match &self.rule {
            Rule::Monthly(MonthlyRule::WeekdayOfMonth { week, .. }) => Some(*week),
            Rule::Monthly(MonthlyRule::LastWeekday { .. }) => Some(-1),
            _ => None,
        }
    }
}
