//! Calendar period filter used by sales listings and dashboards.
//!
//! A filter is written either as a four-digit year (`2024`) or as a
//! year-month pair (`2024-03`). Both resolve to an inclusive UTC range that
//! ends on the last millisecond of the period.

use core::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MonthFilter`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthFilterError {
    /// Not `YYYY` or `YYYY-MM`.
    #[error("period must be YYYY or YYYY-MM, got {0:?}")]
    InvalidFormat(String),
    /// Month outside 1..=12.
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
}

/// A whole year or a single month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MonthFilter {
    /// Every day of the given year.
    Year(i32),
    /// Every day of one month.
    Month {
        /// Calendar year.
        year: i32,
        /// Month, 1 through 12.
        month: u32,
    },
}

impl MonthFilter {
    /// Parse `YYYY` or `YYYY-MM`.
    ///
    /// # Errors
    ///
    /// Returns [`MonthFilterError::InvalidFormat`] for any other shape and
    /// [`MonthFilterError::InvalidMonth`] for a month outside 1..=12.
    pub fn parse(s: &str) -> Result<Self, MonthFilterError> {
        let s = s.trim();
        let invalid = || MonthFilterError::InvalidFormat(s.to_owned());

        let (year_part, month_part) = match s.split_once('-') {
            Some((y, m)) => (y, Some(m)),
            None => (s, None),
        };

        if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_| invalid())?;

        let Some(month_part) = month_part else {
            return Ok(Self::Year(year));
        };

        if !(1..=2).contains(&month_part.len()) || !month_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(MonthFilterError::InvalidMonth(month));
        }

        Ok(Self::Month { year, month })
    }

    /// Inclusive `(start, end)` bounds of the period in UTC.
    ///
    /// `start` is midnight on the first day; `end` is 23:59:59.999 on the
    /// last day.
    #[must_use]
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let (first, next) = match *self {
            Self::Year(year) => (first_of(year, 1), first_of(year + 1, 1)),
            Self::Month { year, month: 12 } => (first_of(year, 12), first_of(year + 1, 1)),
            Self::Month { year, month } => (first_of(year, month), first_of(year, month + 1)),
        };
        (first, next - Duration::milliseconds(1))
    }

    /// Whether `at` falls inside the period.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        start <= at && at <= end
    }
}

fn first_of(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year:04}"),
            Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

impl std::str::FromStr for MonthFilter {
    type Err = MonthFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MonthFilter {
    type Error = MonthFilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthFilter> for String {
    fn from(filter: MonthFilter) -> Self {
        filter.to_string()
    }
}
