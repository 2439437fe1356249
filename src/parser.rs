use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use thiserror::Error;

use crate::reminder::ReminderTrigger;

static REMINDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Case folding is ASCII only, so look-alikes such as `ſ` are not units.
    Regex::new(
        r"(?P<text>.+) (?i-u:in) (?P<value>[0-9]+) (?P<unit>(?i-u:hour|minute|second))(?i-u:s)?$",
    )
    .expect("Reminder pattern is valid.")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseReminderError {
    #[error("expected \"<what> in <number> <hours|minutes|seconds>\"")]
    NoMatch,

    #[error("\"{value} {unit}\" is too far in the future")]
    OutOfRange { value: String, unit: TimeUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    fn from_match(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "hour" => Some(TimeUnit::Hour),
            "minute" => Some(TimeUnit::Minute),
            "second" => Some(TimeUnit::Second),
            _ => None,
        }
    }

    fn delta(self, value: i64) -> Option<TimeDelta> {
        match self {
            TimeUnit::Hour => TimeDelta::try_hours(value),
            TimeUnit::Minute => TimeDelta::try_minutes(value),
            TimeUnit::Second => TimeDelta::try_seconds(value),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TimeUnit::Hour => "hours",
            TimeUnit::Minute => "minutes",
            TimeUnit::Second => "seconds",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReminder {
    pub text: String,
    pub trigger: ReminderTrigger,
}

/// Splits input like `call mom in 2 hours` into the label and the moment,
/// relative to `now`, at which it should fire.
///
/// The label is greedy: in `a in 1 hour in 2 minutes` only the last
/// `in <value> <unit>` is the time expression.
pub fn parse_reminder_text(
    input: &str,
    now: DateTime<Utc>,
) -> Result<ParsedReminder, ParseReminderError> {
    let captures = REMINDER_PATTERN
        .captures(input.trim())
        .ok_or(ParseReminderError::NoMatch)?;

    let text = &captures["text"];
    let value = &captures["value"];
    let unit = TimeUnit::from_match(&captures["unit"]).ok_or(ParseReminderError::NoMatch)?;

    let out_of_range = || ParseReminderError::OutOfRange {
        value: value.to_string(),
        unit,
    };

    let amount: i64 = value.parse().map_err(|_| out_of_range())?;
    let trigger = unit
        .delta(amount)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(out_of_range)?;

    Ok(ParsedReminder {
        text: text.to_string(),
        trigger: ReminderTrigger::new(trigger),
    })
}
