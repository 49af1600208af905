//! Storage facilities and the building blocks of their valuation.
//!
//! [`CmdtyStorage`] is the capability set every valuation engine consumes.
//! [`StorageContract`] is a configurable implementation covering constant or ratcheted
//! constraints and the usual per-unit cost terms.

pub mod contract;
pub mod decision;
pub mod grid;
pub mod space;

pub use contract::{
    InventoryRatchet, PeriodValue, RatchetInterpolation, RatchetTable, StorageContract,
    StorageContractBuilder,
};
pub use decision::bang_bang_decision_set;
pub use grid::{FixedPointsGrid, FixedSpacingGrid, GridKind, InventoryGrid};
pub use space::inventory_space;

use crate::core::{DomesticCashFlow, InjectWithdrawRange};
use crate::time::TimePeriod;

/// Physical and commercial terms of a storage facility, as seen by a valuation engine.
///
/// Decisions are taken in every period from [`start_period`](Self::start_period) up to,
/// but excluding, [`end_period`](Self::end_period). The end period only carries the
/// terminal constraint and payoff.
///
/// Volumes passed to cost and consumption methods are non-negative magnitudes.
pub trait CmdtyStorage<T: TimePeriod>: Send + Sync {
    fn start_period(&self) -> T;

    fn end_period(&self) -> T;

    /// When true the facility must hold no inventory in the end period and the
    /// terminal payoff is zero.
    fn must_be_empty_at_end(&self) -> bool;

    fn min_inventory(&self, period: T) -> f64;

    fn max_inventory(&self, period: T) -> f64;

    /// Signed decision bounds: withdrawal negative, injection positive.
    fn inject_withdraw_range(&self, period: T, inventory: f64) -> InjectWithdrawRange;

    /// Inventories at which [`inject_withdraw_range`](Self::inject_withdraw_range) may
    /// jump in `period`.
    ///
    /// Between consecutive breakpoints the bounds are continuous in inventory; at a
    /// breakpoint they take the value of the piece starting there. The default has no
    /// breakpoints.
    fn inject_withdraw_breakpoints(&self, _period: T) -> Vec<f64> {
        Vec::new()
    }

    /// Fraction of inventory lost over the period.
    fn inventory_percent_loss(&self, period: T) -> f64;

    fn inventory_cost(&self, period: T, inventory: f64) -> Vec<DomesticCashFlow>;

    fn injection_cost(&self, period: T, inventory: f64, injected_volume: f64)
    -> Vec<DomesticCashFlow>;

    fn withdrawal_cost(
        &self,
        period: T,
        inventory: f64,
        withdrawn_volume: f64,
    ) -> Vec<DomesticCashFlow>;

    /// Commodity burnt as fuel on injection, bought at the period price on top of the
    /// injected volume.
    fn cmdty_volume_consumed_on_inject(&self, period: T, inventory: f64, injected_volume: f64)
    -> f64;

    fn cmdty_volume_consumed_on_withdraw(
        &self,
        period: T,
        inventory: f64,
        withdrawn_volume: f64,
    ) -> f64;

    /// Value of inventory left in the end period.
    fn terminal_storage_npv(&self, cmdty_price: f64, terminal_inventory: f64) -> f64;
}
