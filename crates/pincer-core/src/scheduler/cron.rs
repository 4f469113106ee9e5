//! Five-field cron expressions, evaluated in UTC
//!
//! Fields are `minute hour day-of-month month day-of-week`. Each field takes
//! `*`, a value, a range `a-b`, a step `*/n` or `a-b/n`, or a comma list of
//! those. Day-of-week runs 0-7 with both 0 and 7 meaning Sunday. When both
//! day fields are restricted a day matching either one fires.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use super::types::{Result, SchedulerError};

/// How far ahead `next_after` searches before giving up
const SEARCH_YEARS: i32 = 5;

/// A parsed cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minutes: u64,
    hours: u64,
    days: u64,
    months: u64,
    weekdays: u64,
    days_restricted: bool,
    weekdays_restricted: bool,
}

impl CronSchedule {
    /// Parse an expression such as `"0 9 * * 1-5"`
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |reason: String| SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason,
        };

        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        }

        let minutes = parse_field(fields[0], 0, 59).map_err(|e| invalid(format!("minute: {}", e)))?;
        let hours = parse_field(fields[1], 0, 23).map_err(|e| invalid(format!("hour: {}", e)))?;
        let days = parse_field(fields[2], 1, 31).map_err(|e| invalid(format!("day: {}", e)))?;
        let months = parse_field(fields[3], 1, 12).map_err(|e| invalid(format!("month: {}", e)))?;
        let mut weekdays =
            parse_field(fields[4], 0, 7).map_err(|e| invalid(format!("weekday: {}", e)))?;
        if weekdays & (1 << 7) != 0 {
            weekdays = (weekdays & !(1 << 7)) | 1;
        }

        Ok(Self {
            minutes,
            hours,
            days,
            months,
            weekdays,
            days_restricted: !fields[2].starts_with('*'),
            weekdays_restricted: !fields[4].starts_with('*'),
        })
    }

    /// First matching minute strictly after `after`, or `None` if nothing
    /// matches within the search horizon
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after
            .naive_utc()
            .with_second(0)?
            .with_nanosecond(0)?
            .checked_add_signed(chrono::Duration::minutes(1))?;
        let last_year = start.year().checked_add(SEARCH_YEARS)?;

        let mut date = start.date();
        let mut from = start.time();
        while date.year() <= last_year {
            if !has(self.months, date.month()) {
                date = first_of_next_month(date)?;
                from = NaiveTime::MIN;
                continue;
            }
            if self.day_matches(date) {
                if let Some(time) = self.first_time_from(from) {
                    return Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)));
                }
            }
            date = date.succ_opt()?;
            from = NaiveTime::MIN;
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let day = has(self.days, date.day());
        let weekday = has(self.weekdays, date.weekday().num_days_from_sunday());
        match (self.days_restricted, self.weekdays_restricted) {
            (true, true) => day || weekday,
            (true, false) => day,
            (false, true) => weekday,
            (false, false) => true,
        }
    }

    fn first_time_from(&self, from: NaiveTime) -> Option<NaiveTime> {
        (from.hour()..24)
            .filter(|h| has(self.hours, *h))
            .find_map(|h| {
                let first_minute = if h == from.hour() { from.minute() } else { 0 };
                (first_minute..60)
                    .find(|m| has(self.minutes, *m))
                    .and_then(|m| NaiveTime::from_hms_opt(h, m, 0))
            })
    }
}

fn has(mask: u64, value: u32) -> bool {
    mask & (1 << value) != 0
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

fn parse_field(field: &str, min: u32, max: u32) -> std::result::Result<u64, String> {
    let mut mask = 0u64;
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("bad step '{}'", step))?;
                if step == 0 {
                    return Err("step must be at least 1".to_string());
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((lo, hi)) = range.split_once('-') {
            (parse_value(lo, min, max)?, parse_value(hi, min, max)?)
        } else {
            let value = parse_value(range, min, max)?;
            // "5/15" runs from 5 to the end of the field
            (value, if step.is_some() { max } else { value })
        };
        if lo > hi {
            return Err(format!("range {}-{} is reversed", lo, hi));
        }

        for value in (lo..=hi).step_by(step.unwrap_or(1) as usize) {
            mask |= 1 << value;
        }
    }
    Ok(mask)
}

fn parse_value(raw: &str, min: u32, max: u32) -> std::result::Result<u32, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if value < min || value > max {
        return Err(format!("{} is outside {}-{}", value, min, max));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn next(expr: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        CronSchedule::parse(expr).unwrap().next_after(after)
    }

    #[test]
    fn test_every_minute_is_strictly_after() {
        let after = Utc.with_ymd_and_hms(2026, 3, 10, 8, 15, 30).unwrap();
        assert_eq!(next("* * * * *", after), Some(at(2026, 3, 10, 8, 16)));
        assert_eq!(next("* * * * *", at(2026, 3, 10, 8, 15)), Some(at(2026, 3, 10, 8, 16)));
    }

    #[test]
    fn test_steps_and_lists() {
        let after = at(2026, 3, 10, 8, 16);
        assert_eq!(next("*/15 * * * *", after), Some(at(2026, 3, 10, 8, 30)));
        assert_eq!(next("5,50 * * * *", after), Some(at(2026, 3, 10, 8, 50)));
        assert_eq!(next("10/20 * * * *", at(2026, 3, 10, 8, 50)), Some(at(2026, 3, 10, 9, 10)));
    }

    #[test]
    fn test_daily_rolls_over_day_month_and_year() {
        assert_eq!(next("0 9 * * *", at(2026, 3, 10, 9, 0)), Some(at(2026, 3, 11, 9, 0)));
        assert_eq!(next("0 9 * * *", at(2026, 3, 31, 10, 0)), Some(at(2026, 4, 1, 9, 0)));
        assert_eq!(next("30 23 31 12 *", at(2026, 12, 31, 23, 30)), Some(at(2027, 12, 31, 23, 30)));
    }

    #[test]
    fn test_weekdays() {
        // 2026-03-13 is a Friday
        assert_eq!(next("0 9 * * 1-5", at(2026, 3, 13, 10, 0)), Some(at(2026, 3, 16, 9, 0)));
        assert_eq!(next("0 0 * * 7", at(2026, 3, 13, 10, 0)), Some(at(2026, 3, 15, 0, 0)));
        assert_eq!(next("0 0 * * 0", at(2026, 3, 13, 10, 0)), Some(at(2026, 3, 15, 0, 0)));
    }

    #[test]
    fn test_restricted_day_fields_match_either() {
        // The 20th, or any Sunday, whichever comes first
        assert_eq!(next("0 12 20 * 0", at(2026, 3, 13, 0, 0)), Some(at(2026, 3, 15, 12, 0)));
        assert_eq!(next("0 12 20 * 0", at(2026, 3, 16, 0, 0)), Some(at(2026, 3, 20, 12, 0)));
    }

    #[test]
    fn test_leap_day_and_impossible_dates() {
        assert_eq!(next("0 0 29 2 *", at(2026, 1, 1, 0, 0)), Some(at(2028, 2, 29, 0, 0)));
        assert_eq!(next("0 0 30 2 *", at(2026, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_parse_errors() {
        for expr in ["", "* * * *", "* * * * * *", "60 * * * *", "* 24 * * *", "* * 0 * *",
            "* * * 13 *", "* * * * 8", "*/0 * * * *", "5-1 * * * *", "a * * * *"]
        {
            assert!(
                matches!(CronSchedule::parse(expr), Err(SchedulerError::InvalidCron { .. })),
                "{:?} should not parse",
                expr
            );
        }
    }
}
