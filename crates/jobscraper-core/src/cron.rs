//! Five-field cron expressions.
//!
//! Schedules are written in the classic `minute hour day-of-month month
//! day-of-week` form. They are validated here and then translated into the
//! seconds-first form the job scheduler expects.
//!
//! When both day fields are restricted a time matches if either of them
//! does, as in classic cron. The job scheduler requires both, so such a
//! schedule is registered as two expressions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::AppError;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    label: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// First name maps to this value.
    name_base: u32,
}

const MINUTE: FieldSpec = FieldSpec {
    label: "minute",
    min: 0,
    max: 59,
    names: &[],
    name_base: 0,
};
const HOUR: FieldSpec = FieldSpec {
    label: "hour",
    min: 0,
    max: 23,
    names: &[],
    name_base: 0,
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    label: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    name_base: 0,
};
const MONTH: FieldSpec = FieldSpec {
    label: "month",
    min: 1,
    max: 12,
    names: &MONTH_NAMES,
    name_base: 1,
};
// 7 is accepted as an alias for Sunday and folded to 0 after parsing.
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    label: "day-of-week",
    min: 0,
    max: 7,
    names: &WEEKDAY_NAMES,
    name_base: 0,
};

/// A parsed five-field cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    /// 0 = Sunday.
    days_of_week: BTreeSet<u32>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, AppError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(AppError::ConfigError(format!(
                "invalid cron expression '{expression}': expected 5 fields, found {}",
                fields.len()
            )));
        }

        let parse = |raw: &str, spec: FieldSpec| {
            parse_field(raw, spec).map_err(|reason| {
                AppError::ConfigError(format!(
                    "invalid cron expression '{expression}': {} field: {reason}",
                    spec.label
                ))
            })
        };

        let minutes = parse(fields[0], MINUTE)?;
        let hours = parse(fields[1], HOUR)?;
        let days_of_month = parse(fields[2], DAY_OF_MONTH)?;
        let months = parse(fields[3], MONTH)?;
        let days_of_week = parse(fields[4], DAY_OF_WEEK)?
            .into_iter()
            .map(|d| d % 7)
            .collect();

        Ok(Self {
            expression: fields.join(" "),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
        })
    }

    /// The normalized five-field expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Seconds-first, six-field expressions with firing pinned to second 0.
    ///
    /// Returns one expression, or two when both day fields are restricted:
    /// one keyed on the day of month and one on the weekday. Weekdays are
    /// emitted by name so the result does not depend on the scheduler's
    /// numbering of days.
    pub fn to_scheduler_expressions(&self) -> Vec<String> {
        let minutes = render_numeric(&self.minutes, MINUTE);
        let hours = render_numeric(&self.hours, HOUR);
        let dom = render_numeric(&self.days_of_month, DAY_OF_MONTH);
        let months = render_numeric(&self.months, MONTH);
        let dow = if self.days_of_week.len() == 7 {
            "*".to_string()
        } else {
            self.days_of_week
                .iter()
                .map(|d| WEEKDAY_NAMES[*d as usize])
                .collect::<Vec<_>>()
                .join(",")
        };

        if self.days_are_either() {
            vec![
                format!("0 {minutes} {hours} {dom} {months} *"),
                format!("0 {minutes} {hours} * {months} {dow}"),
            ]
        } else {
            vec![format!("0 {minutes} {hours} {dom} {months} {dow}")]
        }
    }

    /// Whether the schedule fires at `at` (seconds are ignored).
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        let dom = self.days_of_month.contains(&at.day());
        let dow = self
            .days_of_week
            .contains(&at.weekday().num_days_from_sunday());
        let day = if self.days_are_either() {
            dom || dow
        } else {
            dom && dow
        };
        day && self.minutes.contains(&at.minute())
            && self.hours.contains(&at.hour())
            && self.months.contains(&at.month())
    }

    fn days_are_either(&self) -> bool {
        self.days_of_month.len() < 31 && self.days_of_week.len() < 7
    }

    pub fn minutes(&self) -> &BTreeSet<u32> {
        &self.minutes
    }

    pub fn hours(&self) -> &BTreeSet<u32> {
        &self.hours
    }

    pub fn days_of_week(&self) -> &BTreeSet<u32> {
        &self.days_of_week
    }
}

impl FromStr for CronSchedule {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn render_numeric(values: &BTreeSet<u32>, spec: FieldSpec) -> String {
    if values.len() as u32 == spec.max - spec.min + 1 {
        return "*".to_string();
    }
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_field(raw: &str, spec: FieldSpec) -> Result<BTreeSet<u32>, String> {
    let mut values = BTreeSet::new();
    for item in raw.split(',') {
        if item.is_empty() {
            return Err(format!("empty list item in '{raw}'"));
        }
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{step}'"))?;
                if step == 0 {
                    return Err("step must be at least 1".to_string());
                }
                (range, step)
            }
            None => (item, 1),
        };

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((lo, hi)) = range.split_once('-') {
            let lo = parse_value(lo, spec)?;
            let hi = parse_value(hi, spec)?;
            if lo > hi {
                return Err(format!("range start {lo} is after end {hi}"));
            }
            (lo, hi)
        } else {
            let value = parse_value(range, spec)?;
            // `5/15` means "from 5 to the end, every 15".
            if item.contains('/') {
                (value, spec.max)
            } else {
                (value, value)
            }
        };

        values.extend((start..=end).step_by(step as usize));
    }
    Ok(values)
}

fn parse_value(raw: &str, spec: FieldSpec) -> Result<u32, String> {
    let upper = raw.to_ascii_uppercase();
    if let Some(pos) = spec.names.iter().position(|n| *n == upper) {
        return Ok(spec.name_base + pos as u32);
    }
    let value: u32 = raw.parse().map_err(|_| format!("invalid value '{raw}'"))?;
    if value < spec.min || value > spec.max {
        return Err(format!(
            "value {value} out of range {}-{}",
            spec.min, spec.max
        ));
    }
    Ok(value)
}
