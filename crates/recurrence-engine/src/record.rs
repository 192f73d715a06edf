//! Flat, storage-friendly form of a [`RecurrencePattern`].
//!
//! Persistence layers store a [`PatternRecord`] (usually as JSON) and hand it
//! back later. Converting a record into a pattern re-runs every construction
//! check, so a tampered or stale record fails with a typed
//! [`ValidationError`] instead of producing a pattern that misbehaves.
//!
//! Records written by older stores that used `recurrence_type` /
//! `monthly_type` as key names are accepted too.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::calendar::{weekday_from_ordinal, weekday_ordinal};
use crate::error::{Result, ValidationError};
use crate::pattern::{
    check_day_of_month, check_interval, check_month_of_year, check_week_of_month, Frequency,
    MonthlyMode, MonthlyRule, RecurrencePattern, Rule, TimeOfDay,
};

/// The serialized shape of a pattern: primitive fields only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// `"daily" | "weekly" | "monthly" | "yearly"`.
    #[serde(alias = "recurrence_type")]
    pub kind: String,
    #[serde(default = "default_interval")]
    pub interval: i64,
    /// Monday = 0 … Sunday = 6. Weekly only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weekdays: Vec<i64>,
    /// `"HH:MM"` strings.
    #[serde(default)]
    pub times_of_day: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<i64>,
    /// `"day_of_month" | "weekday_of_month" | "last_day" | "last_weekday"`.
    /// Monthly only; defaults to `"day_of_month"`.
    #[serde(default, alias = "monthly_type", skip_serializing_if = "Option::is_none")]
    pub monthly_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_of_month: Option<i64>,
    /// ISO-8601 instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<i64>,
}

fn default_interval() -> i64 {
    1
}

impl From<RecurrencePattern> for PatternRecord {
    fn from(pattern: RecurrencePattern) -> Self {
        PatternRecord::from(&pattern)
    }
}

impl From<&RecurrencePattern> for PatternRecord {
    fn from(pattern: &RecurrencePattern) -> Self {
        PatternRecord {
            kind: pattern.frequency().as_str().to_string(),
            interval: i64::from(pattern.interval()),
            weekdays: pattern
                .weekdays()
                .iter()
                .map(|d| i64::from(weekday_ordinal(*d)))
                .collect(),
            times_of_day: pattern
                .times_of_day()
                .iter()
                .map(|t| t.to_string())
                .collect(),
            day_of_month: pattern.day_of_month().map(i64::from),
            month_of_year: pattern.month_of_year().map(i64::from),
            monthly_mode: pattern.monthly_mode().map(|m| m.as_str().to_string()),
            weekday: pattern.weekday().map(|d| i64::from(weekday_ordinal(d))),
            week_of_month: pattern.week_of_month().map(i64::from),
            end_date: pattern.end_date().map(|d| format_instant(&d)),
            max_occurrences: pattern.max_occurrences().map(i64::from),
        }
    }
}

impl TryFrom<PatternRecord> for RecurrencePattern {
    type Error = ValidationError;

    fn try_from(record: PatternRecord) -> Result<Self> {
        let frequency: Frequency = record.kind.parse()?;
        let interval = check_interval(record.interval)?;

        // Range checks apply to every present field, whatever the kind.
        let weekdays = record
            .weekdays
            .iter()
            .map(|d| weekday_from_ordinal(*d))
            .collect::<Result<Vec<_>>>()?;
        if let Some(day) = record.day_of_month {
            check_day_of_month(day)?;
        }
        if let Some(month) = record.month_of_year {
            check_month_of_year(month)?;
        }
        let weekday = record.weekday.map(weekday_from_ordinal).transpose()?;
        if let Some(week) = record.week_of_month {
            check_week_of_month(week)?;
        }

        let times_of_day = record
            .times_of_day
            .iter()
            .map(|t| t.parse::<TimeOfDay>())
            .collect::<Result<Vec<_>>>()?;

        let end_date = record
            .end_date
            .as_deref()
            .map(|s| parse_instant(s).ok_or_else(|| ValidationError::InvalidEndDate(s.to_string())))
            .transpose()?;

        let max_occurrences = record
            .max_occurrences
            .map(|n| {
                u32::try_from(n)
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or(ValidationError::InvalidMaxOccurrences(n))
            })
            .transpose()?;

        // Ranges are checked above, so narrowing casts below are lossless.
        let rule = match frequency {
            Frequency::Daily => Rule::Daily,
            Frequency::Weekly => Rule::Weekly { weekdays },
            Frequency::Monthly => {
                let mode = record
                    .monthly_mode
                    .as_deref()
                    .map(str::parse::<MonthlyMode>)
                    .transpose()?
                    .unwrap_or_default();
                Rule::Monthly(match mode {
                    MonthlyMode::ByDayOfMonth => MonthlyRule::DayOfMonth {
                        day: require(record.day_of_month, "monthly", "day_of_month")? as u32,
                    },
                    MonthlyMode::ByWeekdayOfMonth => MonthlyRule::WeekdayOfMonth {
                        weekday: require(weekday, "monthly", "weekday")?,
                        week: require(record.week_of_month, "monthly", "week_of_month")? as i32,
                    },
                    MonthlyMode::LastDay => MonthlyRule::LastDay,
                    MonthlyMode::LastWeekday => MonthlyRule::LastWeekday {
                        weekday: require(weekday, "monthly", "weekday")?,
                    },
                })
            }
            Frequency::Yearly => Rule::Yearly {
                month: require(record.month_of_year, "yearly", "month_of_year")? as u32,
                day: require(record.day_of_month, "yearly", "day_of_month")? as u32,
            },
        };

        RecurrencePattern::from_parts(rule, interval, times_of_day, end_date, max_occurrences)
    }
}

fn require<T>(value: Option<T>, kind: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(ValidationError::MissingField { kind, field })
}

impl RecurrencePattern {
    /// The flat record for storage.
    pub fn to_record(&self) -> PatternRecord {
        PatternRecord::from(self)
    }

    /// Rebuild a pattern from a stored record, re-running all validation.
    pub fn from_record(record: PatternRecord) -> Result<Self> {
        RecurrencePattern::try_from(record)
    }

    /// Serialize the record as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_record())
            .map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Parse a JSON record and validate it.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Malformed`] when the JSON does not have the record
    /// shape; otherwise the variant for the violated invariant.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: PatternRecord =
            serde_json::from_str(json).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::from_record(record)
    }
}

// ── Instant formatting ──────────────────────────────────────────────────────

/// Format an instant as ISO-8601 (`YYYY-MM-DDTHH:MM:SS`, with fractional
/// seconds only when present).
pub fn format_instant(instant: &NaiveDateTime) -> String {
    if instant.nanosecond() == 0 {
        instant.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        instant.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

/// Parse an ISO-8601 instant.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS[.f]]`, the same with a space separator,
/// RFC 3339 with an offset (converted to UTC, offset dropped), and a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_instant(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
