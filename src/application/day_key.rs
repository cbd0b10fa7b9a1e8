// Date-to-grouping-key conversion
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DayKeyError {
    #[error("invalid date format pattern '{0}'")]
    InvalidPattern(String),
    #[error("date format pattern '{0}' does not identify a calendar date")]
    NotReversible(String),
    #[error("unknown time zone '{0}'")]
    UnknownTimezone(String),
}

/// Renders instants as calendar-date keys in a fixed time zone, and parses
/// those keys back into dates.
#[derive(Debug, Clone, PartialEq)]
pub struct DayKeyFormat {
    pattern: String,
    timezone: Tz,
}

impl DayKeyFormat {
    /// Month/day/year, as an en-US locale renders dates
    pub const DEFAULT_PATTERN: &'static str = "%m/%d/%Y";

    pub fn new(pattern: &str, timezone: &str) -> Result<Self, DayKeyError> {
        if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(DayKeyError::InvalidPattern(pattern.to_string()));
        }

        let timezone: Tz = timezone
            .parse()
            .map_err(|_| DayKeyError::UnknownTimezone(timezone.to_string()))?;

        let format = Self {
            pattern: pattern.to_string(),
            timezone,
        };

        // Keys are re-parsed for the monthly filter, so the pattern must keep year, month and day
        for (year, month, day) in [(2026, 12, 31), (2001, 2, 3)] {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| DayKeyError::NotReversible(pattern.to_string()))?;
            // Time and offset specifiers cannot be rendered from a bare date
            let key = format
                .render(date)
                .map_err(|_| DayKeyError::NotReversible(pattern.to_string()))?;
            if format.date_of(&key) != Some(date) {
                return Err(DayKeyError::NotReversible(pattern.to_string()));
            }
        }

        Ok(format)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Calendar date of an instant in the configured time zone
    pub fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    fn render(&self, date: NaiveDate) -> Result<String, std::fmt::Error> {
        let mut key = String::new();
        write!(key, "{}", date.format(&self.pattern))?;
        Ok(key)
    }

    /// Falls back to ISO `YYYY-MM-DD` if the pattern cannot render the date.
    pub fn key_for(&self, instant: &DateTime<Utc>) -> String {
        let date = self.local_date(instant);
        self.render(date).unwrap_or_else(|_| date.to_string())
    }

    pub fn date_of(&self, key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(key, &self.pattern).ok()
    }
}

impl Default for DayKeyFormat {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
            timezone: Tz::UTC,
        }
    }
}
