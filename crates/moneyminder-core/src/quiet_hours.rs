//! Quiet hours ("do not disturb") evaluation.
//!
//! A window whose start hour is later than its end hour spans midnight,
//! e.g. 22:00 - 08:00. Only hours are compared; minutes are stored and
//! round-tripped but never evaluated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// An hour:minute pair, serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time of day, `None` when out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Time of day on the hour.
    pub fn hour_only(hour: u8) -> Option<Self> {
        Self::new(hour, 0)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Wall-clock time of day of an instant in its own time zone.
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self {
            hour: instant.hour() as u8,
            minute: instant.minute() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
        let hour = h.parse::<u8>().map_err(|_| format!("invalid hour in '{s}'"))?;
        let minute = m.parse::<u8>().map_err(|_| format!("invalid minute in '{s}'"))?;
        Self::new(hour, minute).ok_or_else(|| format!("time out of range: '{s}'"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Configured do-not-disturb window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: TimeOfDay { hour: 22, minute: 0 },
            end: TimeOfDay { hour: 8, minute: 0 },
        }
    }
}

impl QuietHours {
    /// Whether the window is enabled and covers `instant` in local time.
    pub fn is_active_at<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        self.is_active_in(instant, &Local)
    }

    /// Whether the window is enabled and covers `instant` read in `zone`.
    pub fn is_active_in<Tz: TimeZone, Z: TimeZone>(
        &self,
        instant: &DateTime<Tz>,
        zone: &Z,
    ) -> bool {
        self.enabled && is_quiet(TimeOfDay::of(&instant.with_timezone(zone)), self)
    }
}

/// Whether `now` falls inside the window, ignoring `enabled`.
pub fn is_quiet(now: TimeOfDay, window: &QuietHours) -> bool {
    let (start, end, hour) = (window.start.hour, window.end.hour, now.hour);

    // Overnight window (e.g., 22:00 - 08:00)
    if start > end {
        return hour >= start || hour < end;
    }

    // Same-day window (e.g., 09:00 - 17:00)
    hour >= start && hour < end
}
