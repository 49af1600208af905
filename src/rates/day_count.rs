//! Day-count conventions used to turn cash-flow dates into discounting year fractions.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Supported day-count conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCountConvention {
    /// Actual day count over a 360-day year.
    Act360,
    /// Actual day count over a 365-day year.
    #[default]
    Act365Fixed,
}

/// Computes year fraction between two dates under a day-count convention.
///
/// Returns `0.0` for equal dates and is antisymmetric when `start > end`.
///
/// # Examples
/// ```rust
/// use chrono::NaiveDate;
/// use storage_valuation::rates::{DayCountConvention, year_fraction};
///
/// let s = NaiveDate::from_ymd_opt(2019, 9, 2).unwrap();
/// let e = NaiveDate::from_ymd_opt(2019, 10, 20).unwrap();
/// let yf = year_fraction(s, e, DayCountConvention::Act365Fixed);
/// assert!((yf - 48.0 / 365.0).abs() < 1.0e-12);
/// ```
pub fn year_fraction(start: NaiveDate, end: NaiveDate, convention: DayCountConvention) -> f64 {
    if start == end {
        return 0.0;
    }
    if start > end {
        return -year_fraction(end, start, convention);
    }

    let days = (end - start).num_days() as f64;
    match convention {
        DayCountConvention::Act360 => days / 360.0,
        DayCountConvention::Act365Fixed => days / 365.0,
    }
}
