use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::TimeSeries;

/// Reachable inventory bounds for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryRange {
    pub min: f64,
    pub max: f64,
}

impl InventoryRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when no inventory satisfies both bounds, allowing `tolerance` of overlap error.
    #[inline]
    pub fn is_empty(&self, tolerance: f64) -> bool {
        self.min > self.max + tolerance
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn contains(&self, inventory: f64, tolerance: f64) -> bool {
        inventory >= self.min - tolerance && inventory <= self.max + tolerance
    }
}

/// Signed decision bounds at a period/inventory.
///
/// Negative volumes are withdrawals, positive volumes are injections, so
/// `min_inject_withdraw` is minus the maximum withdrawal rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectWithdrawRange {
    pub min_inject_withdraw: f64,
    pub max_inject_withdraw: f64,
}

impl InjectWithdrawRange {
    pub fn new(min_inject_withdraw: f64, max_inject_withdraw: f64) -> Self {
        Self {
            min_inject_withdraw,
            max_inject_withdraw,
        }
    }

    /// Range built from unsigned maximum withdrawal and injection rates.
    pub fn from_rates(max_withdrawal_rate: f64, max_injection_rate: f64) -> Self {
        Self::new(-max_withdrawal_rate, max_injection_rate)
    }
}

/// Cash amount paid or received on a settlement date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomesticCashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl DomesticCashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Replayed operation of the storage in one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageProfile {
    /// Inventory after the period's decision and loss.
    pub inventory: f64,
    /// Injected (positive) or withdrawn (negative) volume.
    pub inject_withdraw_volume: f64,
    /// Commodity burnt as fuel by the decision, bought/sold at the period price.
    pub cmdty_consumed: f64,
    /// Proportional shrinkage of held inventory.
    pub inventory_loss: f64,
    /// Present value realised in the period.
    pub period_pv: f64,
}

impl StorageProfile {
    /// Signed commodity volume traded in the market for the period.
    #[inline]
    pub fn net_volume(&self) -> f64 {
        -self.inject_withdraw_volume - self.cmdty_consumed
    }
}

/// Output of a storage valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult<T> {
    pub net_present_value: f64,
    pub profile: TimeSeries<T, StorageProfile>,
}

impl<T> ValuationResult<T> {
    pub fn new(net_present_value: f64, profile: TimeSeries<T, StorageProfile>) -> Self {
        Self {
            net_present_value,
            profile,
        }
    }

    /// Zero value with no decisions.
    pub fn empty() -> Self {
        Self::new(0.0, TimeSeries::empty())
    }
}
