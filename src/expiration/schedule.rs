//! Schedule Expression Module
//!
//! A cron-like recurrence pattern of five whitespace-separated fields:
//! minute, hour, day-of-month, month, day-of-week. Each field is either `*`
//! or a comma-separated list of values. Day-of-week uses 0 = Sunday.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// How far ahead `next_occurrence` searches before giving up. Covers a full
/// leap cycle, so any satisfiable month/day combination is found.
const SEARCH_HORIZON_DAYS: i64 = 366 * 4;

// == Schedule Field ==
/// One field of the expression: wildcard or an explicit value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Field {
    Any,
    Values(Vec<u32>),
}

impl Field {
    fn parse(text: &str, name: &str, min: u32, max: u32) -> Result<Self> {
        if text == "*" {
            return Ok(Field::Any);
        }
        let mut values = Vec::new();
        for part in text.split(',') {
            let value: u32 = part.parse().map_err(|_| {
                CacheError::Configuration(format!(
                    "invalid schedule expression: {} field '{}' is not a number",
                    name, part
                ))
            })?;
            if value < min || value > max {
                return Err(CacheError::Configuration(format!(
                    "invalid schedule expression: {} value {} outside {}..={}",
                    name, value, min, max
                )));
            }
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values.sort_unstable();
        Ok(Field::Values(values))
    }

    fn matches(&self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::Values(values) => values.contains(&value),
        }
    }
}

// == Schedule Expression ==
/// A parsed five-field recurrence pattern, e.g. `"30 2 * * *"` for every
/// day at 02:30 or `"0 8 1,15 * *"` for 08:00 on the 1st and 15th.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExpression {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl ScheduleExpression {
    // == Parse ==
    /// Parses an expression, validating field count and value ranges.
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CacheError::Configuration(format!(
                "invalid schedule expression '{}': expected 5 fields, got {}",
                expression,
                fields.len()
            )));
        }
        Ok(Self {
            minute: Field::parse(fields[0], "minute", 0, 59)?,
            hour: Field::parse(fields[1], "hour", 0, 23)?,
            day_of_month: Field::parse(fields[2], "day-of-month", 1, 31)?,
            month: Field::parse(fields[3], "month", 1, 12)?,
            day_of_week: Field::parse(fields[4], "day-of-week", 0, 6)?,
        })
    }

    // == Matches ==
    /// Returns true if the given instant (truncated to the minute) matches
    /// the pattern.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        self.minute.matches(at.minute())
            && self.hour.matches(at.hour())
            && self.month.matches(at.month())
            && self.day_matches(at)
    }

    /// Day-of-month and day-of-week combine with cron semantics: when both
    /// are restricted, either one matching is enough.
    fn day_matches(&self, at: DateTime<Utc>) -> bool {
        let dom_ok = self.day_of_month.matches(at.day());
        let dow_ok = self.day_of_week.matches(at.weekday().num_days_from_sunday());
        match (&self.day_of_month, &self.day_of_week) {
            (Field::Values(_), Field::Values(_)) => dom_ok || dow_ok,
            _ => dom_ok && dow_ok,
        }
    }

    // == Next Occurrence ==
    /// Returns the first matching minute strictly after `after`, or None if
    /// no match exists within the search horizon (an unsatisfiable pattern
    /// such as `"0 0 31 2 *"`).
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut cursor = (after + Duration::minutes(1))
            .with_second(0)?
            .with_nanosecond(0)?;
        let limit = after + Duration::days(SEARCH_HORIZON_DAYS);

        while cursor <= limit {
            if !self.month.matches(cursor.month()) || !self.day_matches(cursor) {
                // Skip to midnight of the next day
                let next_day = cursor.date_naive().succ_opt()?;
                cursor = Utc
                    .from_utc_datetime(&next_day.and_hms_opt(0, 0, 0)?);
                continue;
            }
            if !self.hour.matches(cursor.hour()) {
                cursor = cursor.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !self.minute.matches(cursor.minute()) {
                cursor += Duration::minutes(1);
                continue;
            }
            return Some(cursor);
        }
        None
    }
}
