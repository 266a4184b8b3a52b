/// This module handles all time-related operations for the club
///
/// Key concepts:
/// - ClockTime: a wall-clock reading within one day, written as HH:MM
/// - The same shape doubles as a duration (elapsed hours and minutes)
/// - Billing always rounds a duration up to whole hours

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

const MINUTES_PER_HOUR: u8 = 60;
const HOURS_PER_DAY: u8 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid time format: '{0}'")]
    InvalidFormat(String),
    #[error("time '{0}' is well formed but out of range")]
    OutOfRange(String),
}

/// A point in the club's day, or the length of a stay
///
/// Field order matters: the derived `Ord` compares hours first, then minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { hour: 0, minute: 0 };

    /// Create a time point, rejecting values outside a single day
    pub fn new(hour: u8, minute: u8) -> Result<Self, TimeError> {
        if hour >= HOURS_PER_DAY || minute >= MINUTES_PER_HOUR {
            return Err(TimeError::OutOfRange(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(ClockTime { hour, minute })
    }

    /// Parse a strict `HH:MM` reading
    ///
    /// Both fields must be exactly two ASCII digits, so "9:00", "+1:00" and ":00" are all
    /// rejected before any range check happens.
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        let invalid = || TimeError::InvalidFormat(text.to_string());

        let (hours, minutes) = text.split_once(':').ok_or_else(invalid)?;
        let well_formed = |field: &str| field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit());
        if !well_formed(hours) || !well_formed(minutes) {
            return Err(invalid());
        }

        let hour: u8 = hours.parse().map_err(|_| invalid())?;
        let minute: u8 = minutes.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).map_err(|_| TimeError::OutOfRange(text.to_string()))
    }

    pub fn as_minutes(&self) -> u32 {
        u32::from(self.hour) * u32::from(MINUTES_PER_HOUR) + u32::from(self.minute)
    }

    fn from_minutes(total: u32) -> Self {
        let per_hour = u32::from(MINUTES_PER_HOUR);
        ClockTime {
            hour: (total / per_hour) as u8,
            minute: (total % per_hour) as u8,
        }
    }

    pub fn less_or_equal(&self, other: ClockTime) -> bool {
        *self <= other
    }

    /// Check whether this time falls inside `[start, end)`
    /// Example: with opening hours 09:00-20:00, 09:00 is inside and 20:00 is not
    pub fn is_within(&self, start: ClockTime, end: ClockTime) -> bool {
        start <= *self && *self < end
    }

    /// Calculate the duration from `earlier` to this time
    ///
    /// Callers only diff a session start against the current clock, which never runs
    /// backwards, so `earlier` is never after `self`.
    pub fn since(&self, earlier: ClockTime) -> ClockTime {
        debug_assert!(earlier <= *self, "{} is after {}", earlier, self);
        ClockTime::from_minutes(self.as_minutes() - earlier.as_minutes())
    }

    /// Whole hours a duration is billed for: any started hour counts in full
    pub fn ceil_hours(&self) -> u32 {
        u32::from(self.hour) + u32::from(self.minute > 0)
    }

    /// Add a duration, carrying minute overflow into the hours
    pub fn add(&self, other: ClockTime) -> ClockTime {
        ClockTime::from_minutes(self.as_minutes() + other.as_minutes())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
