//! Dates as they arrive from the tracker API: either `YYYY-MM-DD` or an RFC 3339 timestamp.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A point in time, always held in UTC. A date without a time is midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(DateTime<Utc>);

impl Date {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    /// Midnight UTC on the given calendar day. Returns `None` for an invalid day.
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(Self(naive.and_utc()))
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The calendar month, `1..=12`.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The `YYYY-MM` key used to bucket records by month.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }

    /// Fractional days from `earlier` to `self`.
    pub fn days_since(&self, earlier: &Date) -> f64 {
        let millis = (self.0 - earlier.0).num_milliseconds();
        millis as f64 / (1000.0 * 60.0 * 60.0 * 24.0)
    }
}

/// An error produced when a string is neither a calendar date nor an RFC 3339 timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateError(String);

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unable to parse '{}' as a date", self.0)
    }
}

impl std::error::Error for DateError {}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(naive.and_utc()));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| DateError(s.to_string()))
    }
}

/// Displays the calendar day, e.g. `2025-10-01`.
impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}
