/// Club configuration read from the first three lines of an event log:
///
/// ```text
/// 3
/// 09:00 19:00
/// 10
/// ```
///
/// table count, opening and closing time, and the hourly price.

use thiserror::Error;

use super::time::{ClockTime, TimeError};

pub const MAX_TABLES: usize = 10_000;

/// Upper bound on the hours one table can bill in a day: every billed session lasts at
/// least a minute and is charged at most one hour per minute.
const MAX_BILLED_HOURS_PER_TABLE: u64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("table count must be an integer from 1 to {max}, got '{0}'", max = MAX_TABLES)]
    InvalidTableCount(String),
    #[error("working hours must be 'HH:MM HH:MM', got '{0}'")]
    InvalidWorkingHours(String),
    #[error("invalid working hours: {0}")]
    InvalidTime(#[from] TimeError),
    #[error("club must open before it closes ({opening} is not before {closing})")]
    ClosesBeforeOpening { opening: ClockTime, closing: ClockTime },
    #[error("hourly price must be a non-negative integer, got '{0}'")]
    InvalidPrice(String),
    #[error("hourly price {price} is too high to bill {table_count} table(s) for a whole day")]
    PriceTooHigh { price: u64, table_count: usize },
}

/// Which of the three configuration lines an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLine {
    TableCount,
    WorkingHours,
    HourlyPrice,
}

impl ConfigError {
    pub fn line(&self) -> ConfigLine {
        match self {
            ConfigError::InvalidTableCount(_) => ConfigLine::TableCount,
            ConfigError::InvalidWorkingHours(_)
            | ConfigError::InvalidTime(_)
            | ConfigError::ClosesBeforeOpening { .. } => ConfigLine::WorkingHours,
            ConfigError::InvalidPrice(_) | ConfigError::PriceTooHigh { .. } => {
                ConfigLine::HourlyPrice
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubConfig {
    pub table_count: usize,
    pub opening: ClockTime,
    pub closing: ClockTime,
    pub hourly_price: u64,
}

impl ClubConfig {
    pub fn new(
        table_count: usize,
        opening: ClockTime,
        closing: ClockTime,
        hourly_price: u64,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_TABLES).contains(&table_count) {
            return Err(ConfigError::InvalidTableCount(table_count.to_string()));
        }
        if opening >= closing {
            return Err(ConfigError::ClosesBeforeOpening { opening, closing });
        }
        // a full day on every table must fit in the report's total
        let fits = (table_count as u64)
            .checked_mul(MAX_BILLED_HOURS_PER_TABLE)
            .and_then(|hours| hours.checked_mul(hourly_price))
            .is_some();
        if !fits {
            return Err(ConfigError::PriceTooHigh {
                price: hourly_price,
                table_count,
            });
        }
        Ok(ClubConfig {
            table_count,
            opening,
            closing,
            hourly_price,
        })
    }

    pub fn parse_table_count(line: &str) -> Result<usize, ConfigError> {
        match line.parse::<usize>() {
            Ok(count) if (1..=MAX_TABLES).contains(&count) => Ok(count),
            _ => Err(ConfigError::InvalidTableCount(line.to_string())),
        }
    }

    pub fn parse_working_hours(line: &str) -> Result<(ClockTime, ClockTime), ConfigError> {
        let fields: Vec<&str> = line.split(' ').collect();
        let [opening, closing] = fields.as_slice() else {
            return Err(ConfigError::InvalidWorkingHours(line.to_string()));
        };
        Ok((ClockTime::parse(opening)?, ClockTime::parse(closing)?))
    }

    pub fn parse_price(line: &str) -> Result<u64, ConfigError> {
        line.parse::<u64>()
            .map_err(|_| ConfigError::InvalidPrice(line.to_string()))
    }

    /// Build the configuration from its three raw lines
    ///
    /// `ConfigError::line` tells which of them was rejected.
    pub fn from_lines(tables: &str, hours: &str, price: &str) -> Result<Self, ConfigError> {
        let table_count = Self::parse_table_count(tables)?;
        let (opening, closing) = Self::parse_working_hours(hours)?;
        let hourly_price = Self::parse_price(price)?;
        Self::new(table_count, opening, closing, hourly_price)
    }
}
