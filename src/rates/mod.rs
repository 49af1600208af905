//! Day counts, discount-factor sources and commodity settlement rules.

pub mod day_count;
pub mod discount;
pub mod settlement;

pub use day_count::{DayCountConvention, year_fraction};
pub use discount::{
    DiscountFactorCache, DiscountFactors, FlatRateDiscounting, NoDiscounting,
    RateCurveDiscounting,
};
pub use settlement::{DayOfFollowingMonth, FirstDayOfPeriod, SettlementRule};
