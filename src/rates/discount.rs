//! Discount-factor sources and the per-valuation discount-factor memo.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::core::ValuationError;
use crate::rates::{DayCountConvention, year_fraction};
use crate::time::{Day, TimeSeries};

/// Discount factor from a cash-flow day back to a reference day.
pub trait DiscountFactors: Send + Sync {
    fn discount_factor(
        &self,
        reference_day: NaiveDate,
        cash_flow_day: NaiveDate,
    ) -> Result<f64, ValuationError>;
}

impl<F> DiscountFactors for F
where
    F: Fn(NaiveDate, NaiveDate) -> f64 + Send + Sync,
{
    fn discount_factor(
        &self,
        reference_day: NaiveDate,
        cash_flow_day: NaiveDate,
    ) -> Result<f64, ValuationError> {
        Ok(self(reference_day, cash_flow_day))
    }
}

/// Every cash flow is worth its face amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscounting;

impl DiscountFactors for NoDiscounting {
    fn discount_factor(&self, _: NaiveDate, _: NaiveDate) -> Result<f64, ValuationError> {
        Ok(1.0)
    }
}

/// Flat continuously compounded rate.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateDiscounting {
    pub rate: f64,
    pub day_count: DayCountConvention,
}

impl FlatRateDiscounting {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            day_count: DayCountConvention::Act365Fixed,
        }
    }

    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }
}

impl DiscountFactors for FlatRateDiscounting {
    fn discount_factor(
        &self,
        reference_day: NaiveDate,
        cash_flow_day: NaiveDate,
    ) -> Result<f64, ValuationError> {
        if cash_flow_day <= reference_day {
            return Ok(1.0);
        }
        let t = year_fraction(reference_day, cash_flow_day, self.day_count);
        Ok((-self.rate * t).exp())
    }
}

/// Continuously compounded zero rates quoted per cash-flow day.
///
/// The rate for a cash flow is the one observed on the cash-flow day itself, applied
/// over the year fraction from the reference day.
#[derive(Debug, Clone)]
pub struct RateCurveDiscounting {
    rates: TimeSeries<Day, f64>,
    day_count: DayCountConvention,
}

impl RateCurveDiscounting {
    pub fn new(rates: TimeSeries<Day, f64>) -> Result<Self, ValuationError> {
        if rates.is_empty() {
            return Err(ValuationError::InvalidInput(
                "interest rate curve cannot be empty".to_string(),
            ));
        }
        if rates.values().iter().any(|r| !r.is_finite()) {
            return Err(ValuationError::InvalidInput(
                "interest rates must be finite".to_string(),
            ));
        }
        Ok(Self {
            rates,
            day_count: DayCountConvention::Act365Fixed,
        })
    }

    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }
}

impl DiscountFactors for RateCurveDiscounting {
    fn discount_factor(
        &self,
        reference_day: NaiveDate,
        cash_flow_day: NaiveDate,
    ) -> Result<f64, ValuationError> {
        if cash_flow_day <= reference_day {
            return Ok(1.0);
        }
        let rate = self.rates.try_get(Day::new(cash_flow_day))?;
        let t = year_fraction(reference_day, cash_flow_day, self.day_count);
        Ok((-rate * t).exp())
    }
}

/// Memoized discount factors to one reference day, scoped to a single valuation.
///
/// Grid workers share the cache, so lookups go through a mutex.
pub struct DiscountFactorCache<'a> {
    reference_day: NaiveDate,
    source: &'a dyn DiscountFactors,
    cache: Mutex<HashMap<NaiveDate, f64>>,
}

impl<'a> DiscountFactorCache<'a> {
    pub fn new(reference_day: NaiveDate, source: &'a dyn DiscountFactors) -> Self {
        Self {
            reference_day,
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn reference_day(&self) -> NaiveDate {
        self.reference_day
    }

    pub fn discount_factor(&self, cash_flow_day: NaiveDate) -> Result<f64, ValuationError> {
        if let Some(df) = self.cache.lock().get(&cash_flow_day) {
            return Ok(*df);
        }
        let df = self
            .source
            .discount_factor(self.reference_day, cash_flow_day)?;
        if !df.is_finite() {
            return Err(ValuationError::NumericalError(format!(
                "discount factor for {cash_flow_day} is not finite"
            )));
        }
        self.cache.lock().insert(cash_flow_day, df);
        Ok(df)
    }

    /// Number of distinct cash-flow days looked up so far.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for DiscountFactorCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountFactorCache")
            .field("reference_day", &self.reference_day)
            .field("cached", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cache_calls_source_once_per_date() {
        let calls = AtomicUsize::new(0);
        let source = |_: NaiveDate, _: NaiveDate| {
            calls.fetch_add(1, Ordering::SeqCst);
            0.97
        };
        let cache = DiscountFactorCache::new(date(2019, 9, 2), &source);
        for _ in 0..5 {
            assert_relative_eq!(cache.discount_factor(date(2019, 10, 20)).unwrap(), 0.97);
        }
        cache.discount_factor(date(2019, 11, 20)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn rate_curve_uses_rate_on_cash_flow_day() {
        let start = Day::from_ymd(2019, 9, 2).unwrap();
        let rates = TimeSeries::new(start, vec![0.03; 90]);
        let curve = RateCurveDiscounting::new(rates).unwrap();

        let df = curve
            .discount_factor(date(2019, 9, 2), date(2019, 10, 20))
            .unwrap();
        assert_relative_eq!(df, (-0.03_f64 * 48.0 / 365.0).exp(), epsilon = 1e-14);

        let missing = curve.discount_factor(date(2019, 9, 2), date(2020, 9, 2));
        assert!(matches!(missing, Err(ValuationError::MarketDataMissing(_))));
    }

    #[test]
    fn money_market_rates_discount_on_a_360_day_year() {
        let start = Day::from_ymd(2019, 9, 2).unwrap();
        let curve = RateCurveDiscounting::new(TimeSeries::new(start, vec![0.03; 90]))
            .unwrap()
            .with_day_count(DayCountConvention::Act360);
        let df = curve
            .discount_factor(date(2019, 9, 2), date(2019, 10, 20))
            .unwrap();
        assert_relative_eq!(df, (-0.03_f64 * 48.0 / 360.0).exp(), epsilon = 1e-14);

        let flat = FlatRateDiscounting::new(0.03).with_day_count(DayCountConvention::Act360);
        let df = flat
            .discount_factor(date(2019, 9, 2), date(2019, 10, 20))
            .unwrap();
        assert_relative_eq!(df, (-0.03_f64 * 48.0 / 360.0).exp(), epsilon = 1e-14);
    }

    #[test]
    fn past_cash_flows_are_undiscounted() {
        let flat = FlatRateDiscounting::new(0.05);
        assert_eq!(flat.discount_factor(date(2019, 9, 2), date(2019, 9, 1)).unwrap(), 1.0);
    }

    #[test]
    fn non_finite_factor_is_numerical_error() {
        let source = |_: NaiveDate, _: NaiveDate| f64::NAN;
        let cache = DiscountFactorCache::new(date(2019, 9, 2), &source);
        assert!(matches!(
            cache.discount_factor(date(2019, 9, 3)),
            Err(ValuationError::NumericalError(_))
        ));
    }
}
