//! `YYYYMMDD` date and `HHMM` time fields.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime};

/// Earliest year accepted in a date field.
pub const MIN_YEAR: i32 = 1900;

/// A validated calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date, rejecting impossible ones (month 13, February 30, ...).
    #[must_use]
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        if year < MIN_YEAR {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse an 8-digit `YYYYMMDD` field.
    #[must_use]
    pub fn parse_yyyymmdd(field: &str) -> Option<Self> {
        if !is_digits(field, 8) {
            return None;
        }
        let date = NaiveDate::parse_from_str(field, "%Y%m%d").ok()?;
        (date.year() >= MIN_YEAR).then_some(Self(date))
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Day of the year, 1 through 365 (366 in leap years).
    #[must_use]
    pub fn ordinal(self) -> u32 {
        self.0.ordinal()
    }

    /// Ordinal day as the zero-padded 3-digit julian field.
    #[must_use]
    pub fn julian(self) -> String {
        format!("{:03}", self.ordinal())
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Validate a 4-digit `HHMM` time field.
#[must_use]
pub fn is_valid_hhmm(field: &str) -> bool {
    is_digits(field, 4) && NaiveTime::parse_from_str(field, "%H%M").is_ok()
}

fn is_digits(field: &str, width: usize) -> bool {
    field.len() == width && field.bytes().all(|b| b.is_ascii_digit())
}
