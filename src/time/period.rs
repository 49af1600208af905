//! Discrete delivery periods.
//!
//! Any calendar granularity can drive a valuation as long as it is totally ordered,
//! supports integer offsets and maps onto the day on which it starts (used for
//! discounting and settlement).

use std::fmt;
use std::hash::Hash;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Ordered, discrete time bucket.
pub trait TimePeriod:
    Copy + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Period `n` steps later (earlier for negative `n`).
    fn offset(self, n: i64) -> Self;

    /// Number of steps from `other` to `self`.
    fn offset_from(self, other: Self) -> i64;

    /// Calendar day on which the period starts.
    fn first_day(self) -> NaiveDate;

    #[inline]
    fn next(self) -> Self {
        self.offset(1)
    }

    #[inline]
    fn previous(self) -> Self {
        self.offset(-1)
    }

    /// Inclusive iterator over `self ..= last`; empty when `last < self`.
    fn range_inclusive(self, last: Self) -> PeriodRange<Self> {
        PeriodRange {
            next: self,
            remaining: (last.offset_from(self) + 1).max(0) as usize,
        }
    }
}

/// Iterator produced by [`TimePeriod::range_inclusive`].
#[derive(Debug, Clone)]
pub struct PeriodRange<T> {
    next: T,
    remaining: usize,
}

impl<T: TimePeriod> Iterator for PeriodRange<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next = out.offset(1);
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: TimePeriod> DoubleEndedIterator for PeriodRange<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.next.offset(self.remaining as i64))
    }
}

impl<T: TimePeriod> ExactSizeIterator for PeriodRange<T> {}

/// Gas-day style daily period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(NaiveDate);

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl TimePeriod for Day {
    #[inline]
    fn offset(self, n: i64) -> Self {
        Self(self.0 + Duration::days(n))
    }

    #[inline]
    fn offset_from(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }

    #[inline]
    fn first_day(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Hourly period, truncated to the start of the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hour(NaiveDateTime);

impl Hour {
    pub fn new(date_time: NaiveDateTime) -> Self {
        let truncated = NaiveTime::from_hms_opt(date_time.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
        Self(date_time.date().and_time(truncated))
    }

    pub fn from_ymd_h(year: i32, month: u32, day: u32, hour: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, 0, 0)
            .map(Self)
    }

    pub fn start(self) -> NaiveDateTime {
        self.0
    }
}

impl TimePeriod for Hour {
    #[inline]
    fn offset(self, n: i64) -> Self {
        Self(self.0 + Duration::hours(n))
    }

    #[inline]
    fn offset_from(self, other: Self) -> i64 {
        (self.0 - other.0).num_hours()
    }

    #[inline]
    fn first_day(self) -> NaiveDate {
        self.0.date()
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:00"))
    }
}

/// Calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Reject anything chrono cannot turn into a first-of-month date.
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    #[inline]
    fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    #[inline]
    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl TimePeriod for Month {
    #[inline]
    fn offset(self, n: i64) -> Self {
        Self::from_ordinal(self.ordinal() + n)
    }

    #[inline]
    fn offset_from(self, other: Self) -> i64 {
        self.ordinal() - other.ordinal()
    }

    #[inline]
    fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
