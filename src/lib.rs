//! Storage-valuation is a library for valuing flexible commodity storage (gas caverns,
//! salt domes, LNG tanks) and deriving the injection/withdrawal schedule that realises
//! that value.
//!
//! The intrinsic engine treats the forward curve as certain and solves the operating
//! problem by backward induction over a discretized inventory space, then replays the
//! optimal decisions forward from the actual starting inventory.
//!
//! References used across modules include:
//! - Boogert and de Jong (2008), *Gas storage valuation using a Monte Carlo method*.
//! - Fritsch and Carlson (1980) for monotone cubic interpolation.
//!
//! Numerical considerations:
//! - Grid strategies trade accuracy against run time; the default spaces 100 points over
//!   the storage's widest inventory range.
//! - Only extreme-point ("bang-bang") decisions are evaluated, which is exact when the
//!   continuation value is concave in inventory.
//! - A numerical tolerance absorbs floating-point error when testing inventory bounds.
//!
//! # Feature Flags
//! - `parallel`: evaluates grid points of each period with Rayon.
//!
//! # Quick Start
//! Value a monthly storage that can fill in two months and empty in two months:
//! ```rust
//! use storage_valuation::prelude::*;
//!
//! let start = Month::new(2024, 4).unwrap();
//! let end = start.offset(4);
//! let storage = StorageContract::builder(start, end)
//!     .min_inventory(0.0)
//!     .max_inventory(1000.0)
//!     .max_injection_rate(500.0)
//!     .max_withdrawal_rate(500.0)
//!     .build()
//!     .unwrap();
//!
//! let curve = TimeSeries::new(start, vec![10.0, 10.5, 12.0, 13.0, 13.0]);
//! let result = IntrinsicValuation::builder()
//!     .storage(storage)
//!     .current_period(start)
//!     .starting_inventory(0.0)
//!     .forward_curve(curve)
//!     .settlement_rule(FirstDayOfPeriod)
//!     .discount_factors(NoDiscounting)
//!     .build()
//!     .unwrap()
//!     .calculate()
//!     .unwrap();
//!
//! // Fill at 10 and 10.5, empty at 12 and 13.
//! assert!((result.net_present_value - 2250.0).abs() < 1e-6);
//! let total: f64 = result.profile.values().iter().map(|p| p.period_pv).sum();
//! assert!((total - result.net_present_value).abs() < 1e-9);
//! ```
//!
//! Load engine settings from JSON:
//! ```rust
//! use storage_valuation::engines::IntrinsicConfig;
//! use storage_valuation::math::InterpolationKind;
//!
//! let cfg = IntrinsicConfig::from_json(r#"{"interpolation": "hermite_monotone"}"#).unwrap();
//! assert_eq!(cfg.interpolation, InterpolationKind::HermiteMonotone);
//! ```
//!
//! Work with day-count conventions:
//! ```rust
//! use chrono::NaiveDate;
//! use storage_valuation::rates::{DayCountConvention, year_fraction};
//!
//! let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//! let yf = year_fraction(start, end, DayCountConvention::Act365Fixed);
//! assert!((yf - 1.0).abs() < 1.0e-8);
//! ```

pub mod core;
pub mod engines;
pub mod math;
pub mod rates;
pub mod storage;
pub mod time;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::*;
    pub use crate::rates::*;
    pub use crate::storage::*;
    pub use crate::time::*;
}
