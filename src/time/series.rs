use serde::{Deserialize, Serialize};

use crate::core::ValuationError;
use crate::time::TimePeriod;

/// Values keyed by a contiguous run of periods.
///
/// Periods are strictly increasing with no gaps, so lookups are an offset from the
/// first period. Lookups outside the covered span return `None` (`get`) or
/// `MarketDataMissing` (`try_get`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T, V> {
    start: Option<T>,
    values: Vec<V>,
}

impl<T, V> TimeSeries<T, V> {
    /// Series covering no periods.
    pub fn empty() -> Self {
        Self {
            start: None,
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<T, V> Default for TimeSeries<T, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: TimePeriod, V> TimeSeries<T, V> {
    /// Series starting at `start` with one value per consecutive period.
    pub fn new(start: T, values: Vec<V>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self {
            start: Some(start),
            values,
        }
    }

    /// Builds a series from `(period, value)` pairs which must be consecutive.
    pub fn from_pairs(pairs: Vec<(T, V)>) -> Result<Self, ValuationError> {
        let Some(&(start, _)) = pairs.first() else {
            return Ok(Self::empty());
        };
        if pairs
            .windows(2)
            .any(|w| w[1].0.offset_from(w[0].0) != 1)
        {
            return Err(ValuationError::InvalidInput(
                "time series periods must be consecutive and strictly increasing".to_string(),
            ));
        }
        Ok(Self::new(start, pairs.into_iter().map(|(_, v)| v).collect()))
    }

    /// Evaluates `f` on every period in `first ..= last`.
    pub fn from_fn<F>(first: T, last: T, f: F) -> Self
    where
        F: FnMut(T) -> V,
    {
        Self::new(first, first.range_inclusive(last).map(f).collect())
    }

    #[inline]
    pub fn start(&self) -> Option<T> {
        self.start.filter(|_| !self.values.is_empty())
    }

    #[inline]
    pub fn end(&self) -> Option<T> {
        self.start()
            .map(|start| start.offset(self.values.len() as i64 - 1))
    }

    /// Position of `period` in the series.
    pub fn index_of(&self, period: T) -> Option<usize> {
        let start = self.start()?;
        let idx = period.offset_from(start);
        if idx < 0 || idx as usize >= self.values.len() {
            return None;
        }
        Some(idx as usize)
    }

    #[inline]
    pub fn get(&self, period: T) -> Option<&V> {
        self.index_of(period).map(|idx| &self.values[idx])
    }

    pub fn try_get(&self, period: T) -> Result<&V, ValuationError> {
        self.get(period).ok_or_else(|| {
            ValuationError::MarketDataMissing(format!("time series has no value for {period}"))
        })
    }

    /// Period and value at position `idx`.
    pub fn get_at(&self, idx: usize) -> Option<(T, &V)> {
        let start = self.start()?;
        self.values
            .get(idx)
            .map(|value| (start.offset(idx as i64), value))
    }

    /// True when every period in `first ..= last` has a value.
    pub fn covers(&self, first: T, last: T) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => start <= first && last <= end,
            _ => false,
        }
    }

    pub fn periods(&self) -> impl Iterator<Item = T> + '_ {
        self.start()
            .into_iter()
            .flat_map(move |start| start.range_inclusive(start.offset(self.values.len() as i64 - 1)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, &V)> + '_ {
        self.periods().zip(self.values.iter())
    }

    pub fn map<U, F>(&self, f: F) -> TimeSeries<T, U>
    where
        F: FnMut(&V) -> U,
    {
        TimeSeries {
            start: self.start(),
            values: self.values.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Day, Month};

    fn day(y: i32, m: u32, d: u32) -> Day {
        Day::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn lookups_follow_period_offsets() {
        let ts = TimeSeries::new(day(2019, 9, 1), vec![1.0, 2.0, 3.0]);
        assert_eq!(ts.end(), Some(day(2019, 9, 3)));
        assert_eq!(ts.get(day(2019, 9, 2)), Some(&2.0));
        assert_eq!(ts.get(day(2019, 8, 31)), None);
        assert!(matches!(
            ts.try_get(day(2019, 9, 4)),
            Err(ValuationError::MarketDataMissing(_))
        ));
        assert!(ts.covers(day(2019, 9, 1), day(2019, 9, 3)));
        assert!(!ts.covers(day(2019, 9, 1), day(2019, 9, 4)));
    }

    #[test]
    fn from_pairs_rejects_gaps() {
        let m = Month::new(2024, 1).unwrap();
        let ok = TimeSeries::from_pairs(vec![(m, 1), (m.next(), 2)]).unwrap();
        assert_eq!(ok.len(), 2);

        let gap = TimeSeries::from_pairs(vec![(m, 1), (m.offset(2), 2)]);
        assert!(matches!(gap, Err(ValuationError::InvalidInput(_))));

        let unordered = TimeSeries::from_pairs(vec![(m.next(), 1), (m, 2)]);
        assert!(unordered.is_err());
    }

    #[test]
    fn empty_series_has_no_bounds() {
        let ts: TimeSeries<Day, f64> = TimeSeries::empty();
        assert!(ts.is_empty());
        assert_eq!(ts.start(), None);
        assert_eq!(ts.end(), None);
        assert_eq!(ts.iter().count(), 0);
        assert!(!ts.covers(day(2019, 9, 1), day(2019, 9, 1)));
    }

    #[test]
    fn iter_pairs_periods_with_values() {
        let ts = TimeSeries::from_fn(day(2019, 9, 1), day(2019, 9, 3), |d| d.offset_from(day(2019, 9, 1)));
        let pairs: Vec<_> = ts.iter().map(|(d, v)| (d, *v)).collect();
        assert_eq!(pairs[2], (day(2019, 9, 3), 2));
        assert_eq!(ts.get_at(1), Some((day(2019, 9, 2), &1)));
    }
}
