//! Cron expressions.
//!
//! Accepts the standard 5-field form (`minute hour day month weekday`), the
//! 6-field form with a leading seconds field, and the `@yearly`, `@monthly`,
//! `@weekly`, `@daily` and `@hourly` shorthands. Everything is rewritten into
//! the seconds-first form the `cron` crate parses. Standard weekday numbers
//! (0-7, Sunday is 0 or 7) are rewritten as day names because the `cron`
//! crate numbers weekdays differently.
//!
//! When both the day-of-month and the day-of-week fields are restricted the
//! expression fires on days matching either one, as classic cron does. The
//! `cron` crate requires both to match, so such expressions are split into
//! two schedules and the earlier fire time wins.

use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;

use crate::error::SchedulerError;

const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A parsed cron schedule.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expr: String,
    /// One schedule, or two whose fire times are merged.
    schedules: Vec<Schedule>,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, SchedulerError> {
        let normalized = normalize(expr)?;
        let schedules = split_day_fields(&normalized)
            .iter()
            .map(|e| Schedule::from_str(e))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SchedulerError::invalid_schedule(expr, e.to_string()))?;
        Ok(Self {
            expr: expr.trim().to_string(),
            schedules,
        })
    }

    /// The expression as written.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First fire time strictly after `after`.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedules
            .iter()
            .filter_map(|s| s.after(after).next())
            .min()
    }

    /// Next fire time from now, in local time.
    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.schedules
            .iter()
            .filter_map(|s| s.upcoming(Local).next())
            .min()
    }
}

/// Rewrite `expr` into the `cron` crate's seconds-first syntax.
pub(crate) fn normalize(expr: &str) -> Result<String, SchedulerError> {
    let trimmed = expr.trim();

    if let Some(name) = trimmed.strip_prefix('@') {
        let rewritten = match name.to_ascii_lowercase().as_str() {
            "yearly" | "annually" => "0 0 0 1 1 *",
            "monthly" => "0 0 0 1 * *",
            "weekly" => "0 0 0 * * SUN",
            "daily" | "midnight" => "0 0 0 * * *",
            "hourly" => "0 0 * * * *",
            _ => {
                return Err(SchedulerError::invalid_schedule(
                    expr,
                    format!("unsupported shorthand '@{}'", name),
                ));
            }
        };
        return Ok(rewritten.to_string());
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.len() {
        5 => {
            let weekday =
                day_of_week(fields[4]).map_err(|m| SchedulerError::invalid_schedule(expr, m))?;
            Ok(format!(
                "0 {} {} {} {} {}",
                fields[0], fields[1], fields[2], fields[3], weekday
            ))
        }
        6 | 7 => {
            let weekday =
                day_of_week(fields[5]).map_err(|m| SchedulerError::invalid_schedule(expr, m))?;
            let mut fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
            fields[5] = weekday;
            Ok(fields.join(" "))
        }
        n => Err(SchedulerError::invalid_schedule(
            expr,
            format!("expected 5 or 6 fields, found {}", n),
        )),
    }
}

fn is_unrestricted(field: &str) -> bool {
    field == "*" || field == "?"
}

/// Split a normalized expression whose day-of-month and day-of-week are both
/// restricted into a day-of-month schedule and a day-of-week schedule.
pub(crate) fn split_day_fields(normalized: &str) -> Vec<String> {
    let fields: Vec<&str> = normalized.split_whitespace().collect();
    if fields.len() < 6 || is_unrestricted(fields[3]) || is_unrestricted(fields[5]) {
        return vec![normalized.to_string()];
    }

    let with = |index: usize| {
        let mut copy = fields.clone();
        copy[index] = "*";
        copy.join(" ")
    };
    vec![with(5), with(3)]
}

fn day_of_week(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut days: Vec<&str> = Vec::new();
    for part in field.split(',') {
        for day in expand_day_part(part)? {
            let name = WEEKDAYS[(day % 7) as usize];
            if !days.contains(&name) {
                days.push(name);
            }
        }
    }
    Ok(days.join(","))
}

fn expand_day_part(part: &str) -> Result<Vec<u32>, String> {
    let (range, step) = match part.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("invalid weekday step '{}'", step))?;
            if step == 0 {
                return Err("weekday step must be positive".to_string());
            }
            (range, Some(step))
        }
        None => (part, None),
    };

    let (start, end) = if range == "*" {
        (0, 6)
    } else if let Some((a, b)) = range.split_once('-') {
        (day_number(a)?, day_number(b)?)
    } else {
        let day = day_number(range)?;
        (day, if step.is_some() { 6 } else { day })
    };
    if start > end {
        return Err(format!("weekday range '{}' runs backwards", range));
    }

    Ok((start..=end).step_by(step.unwrap_or(1) as usize).collect())
}

fn day_number(token: &str) -> Result<u32, String> {
    if let Ok(n) = token.parse::<u32>() {
        return if n <= 7 {
            Ok(n)
        } else {
            Err(format!("weekday {} out of range (0-7)", n))
        };
    }
    WEEKDAYS
        .iter()
        .position(|d| d.eq_ignore_ascii_case(token))
        .map(|i| i as u32)
        .ok_or_else(|| format!("invalid weekday '{}'", token))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
