//! Cron expression evaluation.
//!
//! Standard five fields (minute, hour, day-of-month, month, day-of-week)
//! with lists, ranges and step values. All evaluation is over whatever
//! instant the caller passes in, expected UTC; no timezone conversion
//! happens here, that is the caller's responsibility.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use std::fmt;
use thiserror::Error;

/// Errors from parsing a cron expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronParseError {
    #[error("Expected 5 fields, got {0}")]
    FieldCount(usize),

    #[error("Invalid {field} field: '{value}'")]
    InvalidField {
        field: &'static str,
        value: String,
    },

    #[error("{field} value {value} out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Invalid step in {field} field: '{value}'")]
    InvalidStep {
        field: &'static str,
        value: String,
    },
}

/// One parsed cron field: a set of permitted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet {
    bits: u64,
    /// Whether the field was written as something narrower than `*`
    restricted: bool,
}

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value < 64 && self.bits & (1 << value) != 0
    }
}

/// A parsed 5-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
    source: String,
}

impl CronExpression {
    /// Parse a 5-field expression, e.g. `0 2 * * *` or `*/6 9-17 * * 1-5`.
    pub fn parse(expr: &str) -> Result<Self, CronParseError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronParseError::FieldCount(fields.len()));
        }

        Ok(Self {
            minutes: parse_field(fields[0], "minute", 0, 59, |v| v)?,
            hours: parse_field(fields[1], "hour", 0, 23, |v| v)?,
            days_of_month: parse_field(fields[2], "day-of-month", 1, 31, |v| v)?,
            months: parse_field(fields[3], "month", 1, 12, |v| v)?,
            // 7 is accepted as an alias for Sunday
            days_of_week: parse_field(fields[4], "day-of-week", 0, 7, |v| v % 7)?,
            source: expr.to_string(),
        })
    }

    /// The next instant strictly after `after` that satisfies the
    /// expression, or `None` if no such instant exists within the search
    /// horizon (an unsatisfiable schedule like `0 0 31 2 *`).
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        // Truncate to the minute and step past the reference.
        let mut t = Utc
            .with_ymd_and_hms(
                after.year(),
                after.month(),
                after.day(),
                after.hour(),
                after.minute(),
                0,
            )
            .single()?
            + Duration::minutes(1);

        // Four years covers every leap-day/OR-semantics combination.
        let horizon = t + Duration::days(4 * 366);

        while t <= horizon {
            if !self.months.contains(t.month()) || !self.day_matches(t.date_naive()) {
                // Jump to the start of the next day.
                let next_day = t.date_naive().succ_opt()?;
                t = day_start(next_day)?;
                continue;
            }
            if !self.hours.contains(t.hour()) {
                // Jump to the start of the next hour.
                t = Utc
                    .with_ymd_and_hms(t.year(), t.month(), t.day(), t.hour(), 0, 0)
                    .single()?
                    + Duration::hours(1);
                continue;
            }
            if self.minutes.contains(t.minute()) {
                return Some(t);
            }
            t = t + Duration::minutes(1);
        }

        None
    }

    /// Day matching with the standard OR rule: when both day-of-month and
    /// day-of-week are restricted, a day matching either one counts.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self
            .days_of_week
            .contains(date.weekday().num_days_from_sunday());

        match (
            self.days_of_month.restricted,
            self.days_of_week.restricted,
        ) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
        .single()
}

/// Parse one field spec: `*`, `*/step`, and comma lists of `value`,
/// `start-end`, or `start-end/step`.
fn parse_field(
    spec: &str,
    field: &'static str,
    min: u32,
    max: u32,
    normalize: fn(u32) -> u32,
) -> Result<FieldSet, CronParseError> {
    let mut bits: u64 = 0;
    let restricted = spec != "*";

    for part in spec.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| CronParseError::InvalidStep {
                    field,
                    value: part.to_string(),
                })?;
                if step == 0 {
                    return Err(CronParseError::InvalidStep {
                        field,
                        value: part.to_string(),
                    });
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((lo, hi)) = range.split_once('-') {
            let lo = parse_value(lo, field, min, max)?;
            let hi = parse_value(hi, field, min, max)?;
            if lo > hi {
                return Err(CronParseError::InvalidField {
                    field,
                    value: part.to_string(),
                });
            }
            (lo, hi)
        } else {
            let v = parse_value(range, field, min, max)?;
            (v, v)
        };

        let mut v = start;
        while v <= end {
            bits |= 1 << normalize(v);
            v += step;
        }
    }

    if bits == 0 {
        return Err(CronParseError::InvalidField {
            field,
            value: spec.to_string(),
        });
    }

    Ok(FieldSet { bits, restricted })
}

fn parse_value(s: &str, field: &'static str, min: u32, max: u32) -> Result<u32, CronParseError> {
    let value: u32 = s.parse().map_err(|_| CronParseError::InvalidField {
        field,
        value: s.to_string(),
    })?;
    if value < min || value > max {
        return Err(CronParseError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn next(expr: &str, reference: DateTime<Utc>) -> DateTime<Utc> {
        CronExpression::parse(expr)
            .unwrap()
            .next_after(reference)
            .unwrap()
    }

    #[test]
    fn test_daily_at_two() {
        assert_eq!(
            next("0 2 * * *", at(2024, 1, 1, 5, 0)),
            at(2024, 1, 2, 2, 0)
        );
        // Before 02:00 the run is still today
        assert_eq!(
            next("0 2 * * *", at(2024, 1, 1, 1, 30)),
            at(2024, 1, 1, 2, 0)
        );
    }

    #[test]
    fn test_minute_steps() {
        assert_eq!(
            next("*/6 * * * *", at(2024, 1, 1, 0, 3)),
            at(2024, 1, 1, 0, 6)
        );
        // Exactly on a match: strictly after means the next one
        assert_eq!(
            next("*/6 * * * *", at(2024, 1, 1, 0, 6)),
            at(2024, 1, 1, 0, 12)
        );
        // Past the last step of the hour
        assert_eq!(
            next("*/6 * * * *", at(2024, 1, 1, 0, 55)),
            at(2024, 1, 1, 1, 0)
        );
    }

    #[test]
    fn test_seconds_are_truncated() {
        let reference = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 59).unwrap();
        let cron = CronExpression::parse("6 * * * *").unwrap();
        assert_eq!(cron.next_after(reference), Some(at(2024, 1, 1, 0, 6)));
    }

    #[test]
    fn test_lists_and_ranges() {
        assert_eq!(
            next("0 9,17 * * *", at(2024, 3, 10, 10, 0)),
            at(2024, 3, 10, 17, 0)
        );
        assert_eq!(
            next("30 9-11 * * *", at(2024, 3, 10, 10, 45)),
            at(2024, 3, 10, 11, 30)
        );
        assert_eq!(
            next("10-20/5 * * * *", at(2024, 3, 10, 10, 16)),
            at(2024, 3, 10, 10, 20)
        );
    }

    #[test]
    fn test_weekday_only() {
        // 2024-06-01 is a Saturday; 1-5 means Monday-Friday
        assert_eq!(
            next("0 9 * * 1-5", at(2024, 6, 1, 12, 0)),
            at(2024, 6, 3, 9, 0)
        );
        // 7 is Sunday, same as 0
        assert_eq!(
            next("0 9 * * 7", at(2024, 6, 1, 12, 0)),
            at(2024, 6, 2, 9, 0)
        );
    }

    #[test]
    fn test_dom_dow_or_semantics() {
        // Both restricted: the 15th OR a Monday, whichever comes first.
        // From Sat 2024-06-01, the first Monday is June 3rd.
        assert_eq!(
            next("0 0 15 * 1", at(2024, 6, 1, 12, 0)),
            at(2024, 6, 3, 0, 0)
        );
        // From Fri 2024-06-07 the next Monday precedes the 15th
        assert_eq!(
            next("0 0 15 * 1", at(2024, 6, 7, 12, 0)),
            at(2024, 6, 10, 0, 0)
        );
        // Only dom restricted: dow wildcard does not widen the match
        assert_eq!(
            next("0 0 15 * *", at(2024, 6, 1, 12, 0)),
            at(2024, 6, 15, 0, 0)
        );
    }

    #[test]
    fn test_month_and_year_rollover() {
        assert_eq!(
            next("0 2 1 * *", at(2024, 1, 31, 12, 0)),
            at(2024, 2, 1, 2, 0)
        );
        assert_eq!(
            next("0 0 1 1 *", at(2024, 3, 1, 0, 0)),
            at(2025, 1, 1, 0, 0)
        );
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(
            next("0 12 29 2 *", at(2023, 3, 1, 0, 0)),
            at(2024, 2, 29, 12, 0)
        );
    }

    #[test]
    fn test_unsatisfiable_returns_none() {
        let cron = CronExpression::parse("0 0 31 2 *").unwrap();
        assert_eq!(cron.next_after(at(2024, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            CronExpression::parse("0 2 * *"),
            Err(CronParseError::FieldCount(4))
        );
        assert!(matches!(
            CronExpression::parse("61 * * * *"),
            Err(CronParseError::OutOfRange { field: "minute", .. })
        ));
        assert!(matches!(
            CronExpression::parse("* 24 * * *"),
            Err(CronParseError::OutOfRange { field: "hour", .. })
        ));
        assert!(matches!(
            CronExpression::parse("*/0 * * * *"),
            Err(CronParseError::InvalidStep { .. })
        ));
        assert!(matches!(
            CronExpression::parse("a * * * *"),
            Err(CronParseError::InvalidField { .. })
        ));
        assert!(matches!(
            CronExpression::parse("5-2 * * * *"),
            Err(CronParseError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_display_round_trips_source() {
        let cron = CronExpression::parse("*/6 9-17 * * 1-5").unwrap();
        assert_eq!(cron.to_string(), "*/6 9-17 * * 1-5");
    }
}
