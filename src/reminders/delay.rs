// Reminder delays: "<amount><unit>" parsing and human-readable durations

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

static DELAY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([smhd])$").expect("valid delay regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("Invalid time format. Use e.g. 1h, 30m, 2d (s=seconds, m=minutes, h=hours, d=days)")]
    InvalidFormat(String),

    #[error("Reminder time must be greater than zero.")]
    ZeroDuration,

    #[error("Reminder time too long. Maximum is {max_days} days.")]
    TooLong { max_days: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl DelayUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "s" => Some(DelayUnit::Seconds),
            "m" => Some(DelayUnit::Minutes),
            "h" => Some(DelayUnit::Hours),
            "d" => Some(DelayUnit::Days),
            _ => None,
        }
    }

    fn seconds(self) -> u64 {
        match self {
            DelayUnit::Seconds => 1,
            DelayUnit::Minutes => 60,
            DelayUnit::Hours => 3_600,
            DelayUnit::Days => 86_400,
        }
    }

    fn name(self) -> &'static str {
        match self {
            DelayUnit::Seconds => "second",
            DelayUnit::Minutes => "minute",
            DelayUnit::Hours => "hour",
            DelayUnit::Days => "day",
        }
    }
}

/// A validated reminder delay such as `10m`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDelay {
    amount: u64,
    unit: DelayUnit,
}

impl ReminderDelay {
    /// Parse `<integer><unit>` (unit one of s, m, h, d), rejecting zero and
    /// anything longer than `max_days`.
    pub fn parse(text: &str, max_days: u64) -> Result<Self, ReminderError> {
        let text = text.trim();
        let caps = DELAY_PATTERN
            .captures(text)
            .ok_or_else(|| ReminderError::InvalidFormat(text.to_string()))?;

        let amount: u64 = caps[1]
            .parse()
            .map_err(|_| ReminderError::TooLong { max_days })?;
        let unit = DelayUnit::from_suffix(&caps[2])
            .ok_or_else(|| ReminderError::InvalidFormat(text.to_string()))?;

        if amount == 0 {
            return Err(ReminderError::ZeroDuration);
        }

        let total = amount
            .checked_mul(unit.seconds())
            .ok_or(ReminderError::TooLong { max_days })?;
        if total > max_days.saturating_mul(DelayUnit::Days.seconds()) {
            return Err(ReminderError::TooLong { max_days });
        }

        Ok(Self { amount, unit })
    }

    pub fn total_seconds(&self) -> u64 {
        self.amount * self.unit.seconds()
    }

    pub fn as_duration(&self) -> Duration {
        // Bounded by max_days at parse time, so this cannot overflow i64
        Duration::seconds(self.total_seconds() as i64)
    }
}

impl fmt::Display for ReminderDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.amount == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.amount, self.unit.name(), plural)
    }
}

/// "2 hours 5 minutes", "3 minutes 10 seconds", or "Now".
///
/// Seconds are only shown when less than an hour remains.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} hours", hours));
    }
    if minutes > 0 {
        parts.push(format!("{} minutes", minutes));
    }
    if seconds > 0 && hours == 0 {
        parts.push(format!("{} seconds", seconds));
    }

    if parts.is_empty() {
        "Now".to_string()
    } else {
        parts.join(" ")
    }
}
