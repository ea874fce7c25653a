use crate::model::Date;
use anyhow::bail;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The month part of the active filter: a calendar month `1..=12`, or every month.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Month {
    #[default]
    All,
    Month(u32),
}

impl Month {
    pub fn new(month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Month must be between 1 and 12, got {month}");
        }
        Ok(Month::Month(month))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Month::All)
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            Month::All => None,
            Month::Month(m) => Some(*m),
        }
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Month::All => f.write_str("all"),
            Month::Month(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for Month {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Month::All);
        }
        match s.parse::<u32>() {
            Ok(m) => Month::new(m),
            Err(_) => bail!("Expected a month number 1-12 or 'all', got '{s}'"),
        }
    }
}

impl Serialize for Month {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Month::All => serializer.serialize_str("all"),
            Month::Month(m) => serializer.serialize_u32(*m),
        }
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MonthVisitor)
    }
}

struct MonthVisitor;

impl<'de> Visitor<'de> for MonthVisitor {
    type Value = Month;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a month number 1-12 or \"all\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Month, E> {
        let m = u32::try_from(v).map_err(E::custom)?;
        Month::new(m).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Month, E> {
        let m = u32::try_from(v).map_err(E::custom)?;
        Month::new(m).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Month, E> {
        Month::from_str(v).map_err(E::custom)
    }
}

/// The active time window that every derived figure is computed over.
///
/// With `year` absent and `month` set, the month matches in any year.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub month: Month,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Filter {
    pub fn new(month: Month, year: Option<i32>) -> Self {
        Self { month, year }
    }

    /// Everything, no restriction.
    pub fn all() -> Self {
        Self::default()
    }

    /// Every month of `year`.
    pub fn year(year: i32) -> Self {
        Self::new(Month::All, Some(year))
    }

    /// True when `date` falls inside the window.
    pub fn contains(&self, date: &Date) -> bool {
        let year_ok = self.year.map_or(true, |y| date.year() == y);
        let month_ok = self.month.number().map_or(true, |m| date.month() == m);
        year_ok && month_ok
    }

    /// The query parameters for the tracker API's `all` endpoint. The API counts months from
    /// zero.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(m) = self.month.number() {
            params.push(("month", m.saturating_sub(1).to_string()));
        }
        if let Some(y) = self.year {
            params.push(("year", y.to_string()));
        }
        params
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.month, self.year) {
            (Month::All, None) => f.write_str("all time"),
            (Month::All, Some(y)) => write!(f, "all months {y}"),
            (Month::Month(m), None) => write!(f, "month {m} of every year"),
            (Month::Month(m), Some(y)) => write!(f, "month {m} {y}"),
        }
    }
}
