//! Jalali (Solar Hijri) calendar dates
//!
//! Birth dates, hire dates, term boundaries and exam dates are stored as
//! `YYYY/MM/DD` strings in the Jalali calendar. This module parses and
//! validates them and converts to and from `chrono::NaiveDate` so whole-year
//! differences can be computed against "today" in the same calendar.
//!
//! Leap years follow the 33-year break table used by the Iranian calendar
//! authority (valid for Jalali years -61..3177).

use crate::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Jalali years at which the leap-cycle pattern changes
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// A validated Jalali calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JalaliDate {
    year: i32,
    month: u32,
    day: u32,
}

/// Position of a Jalali year inside the leap cycle
struct YearInfo {
    /// Years since the last leap year (0 = this year is leap)
    leap: i32,
    /// Gregorian year in which this Jalali year begins
    gregorian_year: i32,
    /// Day of March on which Farvardin 1 falls
    march_day: i32,
}

fn year_info(jy: i32) -> Option<YearInfo> {
    let last = BREAKS[BREAKS.len() - 1];
    if jy < BREAKS[0] || jy >= last {
        return None;
    }

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march_day = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Some(YearInfo {
        leap,
        gregorian_year: gy,
        march_day,
    })
}

/// Whether the Jalali year has 366 days
pub fn is_leap_year(year: i32) -> bool {
    year_info(year).map(|info| info.leap == 0).unwrap_or(false)
}

/// Number of days in a Jalali month, `None` for an invalid month or year
pub fn month_length(year: i32, month: u32) -> Option<u32> {
    year_info(year)?;
    match month {
        1..=6 => Some(31),
        7..=11 => Some(30),
        12 if is_leap_year(year) => Some(30),
        12 => Some(29),
        _ => None,
    }
}

impl JalaliDate {
    /// Build a date, rejecting days that do not exist
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        let len = month_length(year, month).ok_or_else(|| {
            Error::InvalidInput(format!("Invalid Jalali month {}/{}", year, month))
        })?;
        if day == 0 || day > len {
            return Err(Error::InvalidInput(format!(
                "Invalid Jalali day {}/{}/{}",
                year, month, day
            )));
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Convert to the Gregorian calendar
    pub fn to_gregorian(&self) -> Result<NaiveDate> {
        let info = year_info(self.year)
            .ok_or_else(|| Error::InvalidInput(format!("Jalali year {} out of range", self.year)))?;
        let farvardin_first =
            NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march_day as u32).ok_or_else(
                || Error::Internal(format!("No Farvardin 1 for Jalali year {}", self.year)),
            )?;

        let m = self.month as i64;
        let offset = if m <= 7 { (m - 1) * 31 } else { 6 * 31 + (m - 7) * 30 };
        Ok(farvardin_first + chrono::Duration::days(offset + self.day as i64 - 1))
    }

    /// Convert a Gregorian date to the Jalali calendar
    pub fn from_gregorian(date: NaiveDate) -> Result<Self> {
        let mut jy = date.year() - 621;
        let info = year_info(jy)
            .ok_or_else(|| Error::InvalidInput(format!("Date {} out of Jalali range", date)))?;
        let farvardin_first =
            NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march_day as u32).ok_or_else(
                || Error::Internal(format!("No Farvardin 1 for Jalali year {}", jy)),
            )?;

        let mut k = (date - farvardin_first).num_days();
        if k >= 0 {
            if k <= 185 {
                return Ok(Self {
                    year: jy,
                    month: 1 + (k / 31) as u32,
                    day: (k % 31) as u32 + 1,
                });
            }
            k -= 186;
        } else {
            // Previous Jalali year; leap == 1 means that year had Esfand 30
            jy -= 1;
            k += 179;
            if info.leap == 1 {
                k += 1;
            }
        }

        Ok(Self {
            year: jy,
            month: 7 + (k / 30) as u32,
            day: (k % 30) as u32 + 1,
        })
    }

    /// Today's date in the Jalali calendar (local time zone)
    pub fn today() -> Result<Self> {
        Self::from_gregorian(Local::now().date_naive())
    }

    /// Whole years elapsed from `self` to `today`, floored, never negative
    pub fn whole_years_until(&self, today: &JalaliDate) -> i32 {
        let mut years = today.year - self.year;
        if (today.month, today.day) < (self.month, self.day) {
            years -= 1;
        }
        years.max(0)
    }
}

impl FromStr for JalaliDate {
    type Err = Error;

    /// Parse `YYYY/MM/DD`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidInput(format!(
                "Date '{}' must have the form YYYY/MM/DD",
                s
            )));
        }

        let parse = |part: &str| -> Result<i64> {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::InvalidInput(format!("Invalid Jalali date '{}'", s)));
            }
            part.parse::<i64>()
                .map_err(|_| Error::InvalidInput(format!("Invalid Jalali date '{}'", s)))
        };

        let year = parse(parts[0])?;
        let month = parse(parts[1])?;
        let day = parse(parts[2])?;
        if year > i32::MAX as i64 || month > 12 || day > 31 {
            return Err(Error::InvalidInput(format!("Invalid Jalali date '{}'", s)));
        }

        JalaliDate::new(year as i32, month as u32, day as u32)
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Whole years between a stored Jalali date string and today
///
/// `None` when the string does not parse.
pub fn years_since(date: &str) -> Option<i32> {
    let start: JalaliDate = date.parse().ok()?;
    let today = JalaliDate::today().ok()?;
    Some(start.whole_years_until(&today))
}
