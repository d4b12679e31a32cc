//! Dates, day count conventions and schedule frequencies.
//!
//! This module provides:
//! - `Date`: type-safe date wrapper around chrono::NaiveDate
//! - `DayCount`: the day count bases the script language understands
//! - `Tenor`: schedule stepping frequencies ("1W", "3M", ...)

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Provides ISO 8601 parsing and formatting plus day arithmetic.
///
/// # Examples
///
/// ```
/// use tenor_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let start = Date::from_ymd(2024, 1, 1).unwrap();
/// assert_eq!(date - start, 166);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month and day components.
    ///
    /// # Errors
    ///
    /// Returns `DateError::InvalidDate` for impossible combinations
    /// (e.g. February 30th).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from ISO 8601 format (YYYY-MM-DD).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(e.to_string()))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the number of days between two dates, negative if `self`
    /// is before `other`.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day count basis for year fraction calculations.
///
/// These are the two bases the script `DCF` builtin accepts; ACT/365F is
/// also the basis of the simulation timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum DayCount {
    /// Actual/365 Fixed: actual days / 365.0
    Act365F,
    /// Actual/360: actual days / 360.0
    Act360,
}

impl DayCount {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCount::Act365F => "ACT/365F",
            DayCount::Act360 => "ACT/360",
        }
    }

    /// Calculates the year fraction between two dates.
    ///
    /// Negative if `start` is after `end`; the sign indicates direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenor_core::types::time::{Date, DayCount};
    ///
    /// let start = Date::from_ymd(2024, 1, 1).unwrap();
    /// let end = Date::from_ymd(2024, 7, 1).unwrap();
    ///
    /// let yf = DayCount::Act365F.year_fraction(start, end);
    /// assert!((yf - 182.0 / 365.0).abs() < 1e-12);
    /// ```
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        let days = (end - start) as f64;
        match self {
            DayCount::Act365F => days / 365.0,
            DayCount::Act360 => days / 360.0,
        }
    }
}

impl FromStr for DayCount {
    type Err = DateError;

    /// Parses a day count basis from string (case-insensitive).
    ///
    /// Accepts "ACT365F", "ACT/365F", "ACT365", "ACT360" and "ACT/360".
    fn from_str(s: &str) -> Result<Self, DateError> {
        match s.to_uppercase().replace(['/', ' '], "").as_str() {
            "ACT365F" | "ACT365" => Ok(DayCount::Act365F),
            "ACT360" => Ok(DayCount::Act360),
            _ => Err(DateError::ParseError(format!(
                "unknown day count basis: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Schedule stepping frequency.
///
/// Parsed from compact tenor strings: "10D", "1W", "3M", "2Y".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Tenor {
    /// Calendar days
    Days(u32),
    /// Calendar weeks
    Weeks(u32),
    /// Calendar months (end-of-month clamped by chrono)
    Months(u32),
    /// Calendar years
    Years(u32),
}

impl Tenor {
    /// Advances a date by this tenor.
    ///
    /// # Errors
    ///
    /// Returns `DateError::Overflow` if the result leaves the representable
    /// date range.
    pub fn add_to(&self, date: Date) -> Result<Date, DateError> {
        let inner = date.into_inner();
        let next = match *self {
            Tenor::Days(n) => inner.checked_add_days(Days::new(n as u64)),
            Tenor::Weeks(n) => inner.checked_add_days(Days::new(7 * n as u64)),
            Tenor::Months(n) => inner.checked_add_months(Months::new(n)),
            Tenor::Years(n) => inner.checked_add_months(Months::new(12 * n)),
        };
        next.map(Date).ok_or_else(|| DateError::Overflow {
            date: date.to_string(),
            tenor: self.to_string(),
        })
    }
}

impl FromStr for Tenor {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        let s = s.trim();
        if s.len() < 2 {
            return Err(DateError::ParseError(format!("invalid tenor: {}", s)));
        }
        let (count, unit) = s.split_at(s.len() - 1);
        let n: u32 = count
            .parse()
            .map_err(|_| DateError::ParseError(format!("invalid tenor count: {}", s)))?;
        if n == 0 {
            return Err(DateError::ParseError(format!(
                "tenor count must be positive: {}",
                s
            )));
        }
        match unit.to_uppercase().as_str() {
            "D" => Ok(Tenor::Days(n)),
            "W" => Ok(Tenor::Weeks(n)),
            "M" => Ok(Tenor::Months(n)),
            "Y" => Ok(Tenor::Years(n)),
            _ => Err(DateError::ParseError(format!("unknown tenor unit: {}", s))),
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenor::Days(n) => write!(f, "{}D", n),
            Tenor::Weeks(n) => write!(f, "{}W", n),
            Tenor::Months(n) => write!(f, "{}M", n),
            Tenor::Years(n) => write!(f, "{}Y", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_date_from_ymd_valid() {
        let date = Date::from_ymd(2024, 6, 15).unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_date_from_ymd_invalid() {
        assert!(Date::from_ymd(2024, 2, 30).is_err());
        assert!(Date::from_ymd(2024, 13, 1).is_err());
        assert!(Date::from_ymd(2023, 2, 29).is_err());
    }

    #[test]
    fn test_date_parse_and_display_roundtrip() {
        let date = Date::parse("2024-06-15").unwrap();
        assert_eq!(format!("{}", date), "2024-06-15");
        assert!(Date::parse("2024/06/15").is_err());
    }

    #[test]
    fn test_date_subtraction() {
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2024, 1, 11).unwrap();
        assert_eq!(end - start, 10);
        assert_eq!(start - end, -10);
    }

    #[test]
    fn test_act365f_known_dates() {
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2024, 7, 1).unwrap();
        let yf = DayCount::Act365F.year_fraction(start, end);
        assert_relative_eq!(yf, 182.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_act360_known_dates() {
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2024, 7, 1).unwrap();
        let yf = DayCount::Act360.year_fraction(start, end);
        assert_relative_eq!(yf, 182.0 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_year_fraction_negative_direction() {
        let start = Date::from_ymd(2024, 7, 1).unwrap();
        let end = Date::from_ymd(2024, 1, 1).unwrap();
        assert!(DayCount::Act365F.year_fraction(start, end) < 0.0);
    }

    #[test]
    fn test_day_count_from_str() {
        assert_eq!("ACT365F".parse::<DayCount>().unwrap(), DayCount::Act365F);
        assert_eq!("act/365f".parse::<DayCount>().unwrap(), DayCount::Act365F);
        assert_eq!("ACT360".parse::<DayCount>().unwrap(), DayCount::Act360);
        assert!("30/360".parse::<DayCount>().is_err());
    }

    #[test]
    fn test_tenor_from_str() {
        assert_eq!("1W".parse::<Tenor>().unwrap(), Tenor::Weeks(1));
        assert_eq!("3m".parse::<Tenor>().unwrap(), Tenor::Months(3));
        assert_eq!("10D".parse::<Tenor>().unwrap(), Tenor::Days(10));
        assert_eq!("2Y".parse::<Tenor>().unwrap(), Tenor::Years(2));
        assert!("0M".parse::<Tenor>().is_err());
        assert!("M".parse::<Tenor>().is_err());
        assert!("3X".parse::<Tenor>().is_err());
    }

    #[test]
    fn test_tenor_add_to() {
        let date = Date::from_ymd(2024, 1, 31).unwrap();
        // End-of-month clamp
        assert_eq!(
            Tenor::Months(1).add_to(date).unwrap(),
            Date::from_ymd(2024, 2, 29).unwrap()
        );
        assert_eq!(
            Tenor::Weeks(2).add_to(date).unwrap(),
            Date::from_ymd(2024, 2, 14).unwrap()
        );
        assert_eq!(
            Tenor::Years(1).add_to(date).unwrap(),
            Date::from_ymd(2025, 1, 31).unwrap()
        );
    }

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn date_strategy() -> impl Strategy<Value = Date> {
            (2000i32..2100i32, 1u32..13u32, 1u32..29u32)
                .prop_map(|(y, m, d)| Date::from_ymd(y, m, d).unwrap())
        }

        proptest! {
            #[test]
            fn test_year_fraction_additive(
                a in date_strategy(),
                b in date_strategy(),
                c in date_strategy(),
            ) {
                let mut dates = [a, b, c];
                dates.sort();
                let [d1, d2, d3] = dates;
                for basis in [DayCount::Act365F, DayCount::Act360] {
                    let total = basis.year_fraction(d1, d3);
                    let split = basis.year_fraction(d1, d2) + basis.year_fraction(d2, d3);
                    assert_relative_eq!(total, split, epsilon = 1e-12);
                }
            }

            #[test]
            fn test_tenor_advances_strictly(date in date_strategy(), n in 1u32..60) {
                for tenor in [Tenor::Days(n), Tenor::Weeks(n), Tenor::Months(n)] {
                    let next = tenor.add_to(date).unwrap();
                    assert!(next > date);
                }
            }
        }
    }
}
