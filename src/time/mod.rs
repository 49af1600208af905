//! Periods and period-indexed time series.

pub mod period;
pub mod series;

pub use period::{Day, Hour, Month, PeriodRange, TimePeriod};
pub use series::TimeSeries;
