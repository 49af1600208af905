//! Commodity settlement-date rules.

use chrono::{Datelike, NaiveDate};

use crate::time::TimePeriod;

/// Maps a delivery period to the day its commodity trades cash-settle.
pub trait SettlementRule<T: TimePeriod>: Send + Sync {
    fn settlement_day(&self, period: T) -> NaiveDate;
}

impl<T, F> SettlementRule<T> for F
where
    T: TimePeriod,
    F: Fn(T) -> NaiveDate + Send + Sync,
{
    fn settlement_day(&self, period: T) -> NaiveDate {
        self(period)
    }
}

/// Settles on the first day of the delivery period.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDayOfPeriod;

impl<T: TimePeriod> SettlementRule<T> for FirstDayOfPeriod {
    fn settlement_day(&self, period: T) -> NaiveDate {
        period.first_day()
    }
}

/// Settles on a fixed day of the month following the delivery period's first day,
/// e.g. the 20th of next month for monthly-settled gas.
///
/// Days beyond the month length clamp to the last day of the month.
#[derive(Debug, Clone, Copy)]
pub struct DayOfFollowingMonth(pub u32);

impl<T: TimePeriod> SettlementRule<T> for DayOfFollowingMonth {
    fn settlement_day(&self, period: T) -> NaiveDate {
        let first = period.first_day();
        let (year, month) = if first.month() == 12 {
            (first.year() + 1, 1)
        } else {
            (first.year(), first.month() + 1)
        };
        let mut day = self.0.clamp(1, 31);
        loop {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return date;
            }
            day -= 1;
        }
    }
}
