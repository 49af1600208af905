//! Configurable storage contract.
//!
//! Covers the common commercial shape of a gas storage deal: inventory and rate
//! constraints (constant per period or inventory-dependent ratchets), per-unit costs,
//! fuel consumption, proportional losses and an optional terminal payoff.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{DomesticCashFlow, InjectWithdrawRange, ValuationError};
use crate::storage::CmdtyStorage;
use crate::time::{TimePeriod, TimeSeries};

/// Contract term that is either constant or varies per period.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodValue<T> {
    Constant(f64),
    Series(TimeSeries<T, f64>),
}

impl<T> From<f64> for PeriodValue<T> {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl<T> From<TimeSeries<T, f64>> for PeriodValue<T> {
    fn from(series: TimeSeries<T, f64>) -> Self {
        Self::Series(series)
    }
}

impl<T: TimePeriod> PeriodValue<T> {
    /// Value for `period`. Series are validated to cover the storage life on build,
    /// so uncovered periods only arise for out-of-life queries and read as zero.
    #[inline]
    pub fn value(&self, period: T) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Series(series) => series.get(period).copied().unwrap_or(0.0),
        }
    }

    fn validate(
        &self,
        name: &str,
        first: T,
        last: T,
        admissible: impl Fn(f64) -> bool,
        requirement: &str,
    ) -> Result<(), ValuationError> {
        let ok = match self {
            Self::Constant(v) => admissible(*v),
            Self::Series(series) => {
                if !series.covers(first, last) {
                    return Err(ValuationError::InvalidInput(format!(
                        "{name} series must cover every period from {first} to {last}"
                    )));
                }
                first
                    .range_inclusive(last)
                    .all(|p| series.get(p).is_some_and(|v| admissible(*v)))
            }
        };
        if !ok {
            return Err(ValuationError::InvalidInput(format!(
                "{name} must be {requirement}"
            )));
        }
        Ok(())
    }
}

/// How rates are read between ratchet pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatchetInterpolation {
    /// Linear in inventory between neighbouring pillars.
    #[default]
    Linear,
    /// Rates of the highest pillar at or below the inventory.
    Step,
}

/// Maximum rates at one inventory level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryRatchet {
    pub inventory: f64,
    pub max_withdrawal_rate: f64,
    pub max_injection_rate: f64,
}

impl InventoryRatchet {
    pub fn new(inventory: f64, max_withdrawal_rate: f64, max_injection_rate: f64) -> Self {
        Self {
            inventory,
            max_withdrawal_rate,
            max_injection_rate,
        }
    }
}

/// Ratchets applying from `period` until the next table starts.
///
/// The lowest and highest pillar inventories are the minimum and maximum inventory
/// while the table applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatchetTable<T> {
    pub period: T,
    pub ratchets: Vec<InventoryRatchet>,
}

impl<T> RatchetTable<T> {
    pub fn new(period: T, ratchets: Vec<InventoryRatchet>) -> Self {
        Self { period, ratchets }
    }
}

impl<T: TimePeriod> RatchetTable<T> {
    fn validate(&self) -> Result<(), ValuationError> {
        if self.ratchets.is_empty() {
            return Err(ValuationError::InvalidInput(format!(
                "ratchet table starting {} has no pillars",
                self.period
            )));
        }
        if self.ratchets.iter().any(|r| {
            !r.inventory.is_finite()
                || r.inventory < 0.0
                || !r.max_withdrawal_rate.is_finite()
                || r.max_withdrawal_rate < 0.0
                || !r.max_injection_rate.is_finite()
                || r.max_injection_rate < 0.0
        }) {
            return Err(ValuationError::InvalidInput(format!(
                "ratchet table starting {} must have finite, non-negative inventories and rates",
                self.period
            )));
        }
        if self
            .ratchets
            .windows(2)
            .any(|w| w[1].inventory <= w[0].inventory)
        {
            return Err(ValuationError::InvalidInput(format!(
                "ratchet pillars starting {} must have strictly increasing inventory",
                self.period
            )));
        }
        Ok(())
    }

    fn min_inventory(&self) -> f64 {
        self.ratchets.first().map_or(0.0, |r| r.inventory)
    }

    fn max_inventory(&self) -> f64 {
        self.ratchets.last().map_or(0.0, |r| r.inventory)
    }

    fn rates(&self, inventory: f64, interpolation: RatchetInterpolation) -> (f64, f64) {
        let pillars = &self.ratchets;
        let Some((first, last)) = pillars.first().zip(pillars.last()) else {
            return (0.0, 0.0);
        };
        if inventory <= first.inventory {
            return (first.max_withdrawal_rate, first.max_injection_rate);
        }
        if inventory >= last.inventory {
            return (last.max_withdrawal_rate, last.max_injection_rate);
        }
        let upper = pillars.partition_point(|r| r.inventory <= inventory);
        let lo = &pillars[upper - 1];
        let hi = &pillars[upper];
        match interpolation {
            RatchetInterpolation::Step => (lo.max_withdrawal_rate, lo.max_injection_rate),
            RatchetInterpolation::Linear => {
                let w = (inventory - lo.inventory) / (hi.inventory - lo.inventory);
                (
                    lo.max_withdrawal_rate + w * (hi.max_withdrawal_rate - lo.max_withdrawal_rate),
                    lo.max_injection_rate + w * (hi.max_injection_rate - lo.max_injection_rate),
                )
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Constraints<T> {
    Constant {
        min_inventory: PeriodValue<T>,
        max_inventory: PeriodValue<T>,
        max_injection_rate: PeriodValue<T>,
        max_withdrawal_rate: PeriodValue<T>,
    },
    Ratchets {
        tables: Vec<RatchetTable<T>>,
        interpolation: RatchetInterpolation,
    },
}

impl<T: TimePeriod> Constraints<T> {
    fn table(tables: &[RatchetTable<T>], period: T) -> &RatchetTable<T> {
        let idx = tables.partition_point(|t| t.period <= period);
        &tables[idx.saturating_sub(1)]
    }
}

type TerminalNpvFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Storage facility defined by per-period terms.
///
/// Cost cash flows settle on the first day of the period they are incurred in.
#[derive(Clone)]
pub struct StorageContract<T> {
    start: T,
    end: T,
    constraints: Constraints<T>,
    injection_cost: PeriodValue<T>,
    withdrawal_cost: PeriodValue<T>,
    cmdty_consumed_on_injection: PeriodValue<T>,
    cmdty_consumed_on_withdrawal: PeriodValue<T>,
    inventory_loss: PeriodValue<T>,
    inventory_cost: PeriodValue<T>,
    terminal_storage_npv: Option<TerminalNpvFn>,
}

impl<T: TimePeriod> StorageContract<T> {
    /// Starts a builder for a storage active from `start` with terminal period `end`.
    pub fn builder(start: T, end: T) -> StorageContractBuilder<T> {
        StorageContractBuilder {
            start,
            end,
            min_inventory: None,
            max_inventory: None,
            max_injection_rate: None,
            max_withdrawal_rate: None,
            ratchets: None,
            injection_cost: PeriodValue::Constant(0.0),
            withdrawal_cost: PeriodValue::Constant(0.0),
            cmdty_consumed_on_injection: PeriodValue::Constant(0.0),
            cmdty_consumed_on_withdrawal: PeriodValue::Constant(0.0),
            inventory_loss: PeriodValue::Constant(0.0),
            inventory_cost: PeriodValue::Constant(0.0),
            terminal_storage_npv: None,
        }
    }

    fn single_cash_flow(period: T, amount: f64) -> Vec<DomesticCashFlow> {
        vec![DomesticCashFlow::new(period.first_day(), amount)]
    }
}

impl<T: TimePeriod> fmt::Debug for StorageContract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageContract")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("constraints", &self.constraints)
            .field("injection_cost", &self.injection_cost)
            .field("withdrawal_cost", &self.withdrawal_cost)
            .field("inventory_loss", &self.inventory_loss)
            .field("inventory_cost", &self.inventory_cost)
            .field("must_be_empty_at_end", &self.terminal_storage_npv.is_none())
            .finish_non_exhaustive()
    }
}

impl<T: TimePeriod> CmdtyStorage<T> for StorageContract<T> {
    fn start_period(&self) -> T {
        self.start
    }

    fn end_period(&self) -> T {
        self.end
    }

    fn must_be_empty_at_end(&self) -> bool {
        self.terminal_storage_npv.is_none()
    }

    fn min_inventory(&self, period: T) -> f64 {
        if self.must_be_empty_at_end() && period == self.end {
            return 0.0;
        }
        match &self.constraints {
            Constraints::Constant { min_inventory, .. } => min_inventory.value(period),
            Constraints::Ratchets { tables, .. } => {
                Constraints::table(tables, period).min_inventory()
            }
        }
    }

    fn max_inventory(&self, period: T) -> f64 {
        if self.must_be_empty_at_end() && period == self.end {
            return 0.0;
        }
        match &self.constraints {
            Constraints::Constant { max_inventory, .. } => max_inventory.value(period),
            Constraints::Ratchets { tables, .. } => {
                Constraints::table(tables, period).max_inventory()
            }
        }
    }

    fn inject_withdraw_range(&self, period: T, inventory: f64) -> InjectWithdrawRange {
        match &self.constraints {
            Constraints::Constant {
                max_injection_rate,
                max_withdrawal_rate,
                ..
            } => InjectWithdrawRange::from_rates(
                max_withdrawal_rate.value(period),
                max_injection_rate.value(period),
            ),
            Constraints::Ratchets {
                tables,
                interpolation,
            } => {
                let (withdrawal, injection) =
                    Constraints::table(tables, period).rates(inventory, *interpolation);
                InjectWithdrawRange::from_rates(withdrawal, injection)
            }
        }
    }

    fn inject_withdraw_breakpoints(&self, period: T) -> Vec<f64> {
        match &self.constraints {
            Constraints::Constant { .. } => Vec::new(),
            Constraints::Ratchets { tables, .. } => Constraints::table(tables, period)
                .ratchets
                .iter()
                .map(|r| r.inventory)
                .collect(),
        }
    }

    fn inventory_percent_loss(&self, period: T) -> f64 {
        self.inventory_loss.value(period)
    }

    fn inventory_cost(&self, period: T, inventory: f64) -> Vec<DomesticCashFlow> {
        Self::single_cash_flow(period, self.inventory_cost.value(period) * inventory)
    }

    fn injection_cost(
        &self,
        period: T,
        _inventory: f64,
        injected_volume: f64,
    ) -> Vec<DomesticCashFlow> {
        Self::single_cash_flow(period, self.injection_cost.value(period) * injected_volume)
    }

    fn withdrawal_cost(
        &self,
        period: T,
        _inventory: f64,
        withdrawn_volume: f64,
    ) -> Vec<DomesticCashFlow> {
        Self::single_cash_flow(period, self.withdrawal_cost.value(period) * withdrawn_volume)
    }

    fn cmdty_volume_consumed_on_inject(
        &self,
        period: T,
        _inventory: f64,
        injected_volume: f64,
    ) -> f64 {
        self.cmdty_consumed_on_injection.value(period) * injected_volume
    }

    fn cmdty_volume_consumed_on_withdraw(
        &self,
        period: T,
        _inventory: f64,
        withdrawn_volume: f64,
    ) -> f64 {
        self.cmdty_consumed_on_withdrawal.value(period) * withdrawn_volume
    }

    fn terminal_storage_npv(&self, cmdty_price: f64, terminal_inventory: f64) -> f64 {
        self.terminal_storage_npv
            .as_ref()
            .map_or(0.0, |f| f(cmdty_price, terminal_inventory))
    }
}

/// Builder for [`StorageContract`].
///
/// Constraints come either from the four constant/series setters or from
/// [`ratchets`](Self::ratchets), never a mix. Cost terms default to zero.
pub struct StorageContractBuilder<T> {
    start: T,
    end: T,
    min_inventory: Option<PeriodValue<T>>,
    max_inventory: Option<PeriodValue<T>>,
    max_injection_rate: Option<PeriodValue<T>>,
    max_withdrawal_rate: Option<PeriodValue<T>>,
    ratchets: Option<(Vec<RatchetTable<T>>, RatchetInterpolation)>,
    injection_cost: PeriodValue<T>,
    withdrawal_cost: PeriodValue<T>,
    cmdty_consumed_on_injection: PeriodValue<T>,
    cmdty_consumed_on_withdrawal: PeriodValue<T>,
    inventory_loss: PeriodValue<T>,
    inventory_cost: PeriodValue<T>,
    terminal_storage_npv: Option<TerminalNpvFn>,
}

impl<T: TimePeriod> StorageContractBuilder<T> {
    pub fn min_inventory(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.min_inventory = Some(value.into());
        self
    }

    pub fn max_inventory(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.max_inventory = Some(value.into());
        self
    }

    pub fn max_injection_rate(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.max_injection_rate = Some(value.into());
        self
    }

    pub fn max_withdrawal_rate(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.max_withdrawal_rate = Some(value.into());
        self
    }

    /// Inventory-dependent rate tables, ordered by start period.
    pub fn ratchets(
        mut self,
        tables: Vec<RatchetTable<T>>,
        interpolation: RatchetInterpolation,
    ) -> Self {
        self.ratchets = Some((tables, interpolation));
        self
    }

    /// Cost per unit injected.
    pub fn injection_cost(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.injection_cost = value.into();
        self
    }

    /// Cost per unit withdrawn.
    pub fn withdrawal_cost(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.withdrawal_cost = value.into();
        self
    }

    /// Fraction of injected volume burnt as fuel.
    pub fn cmdty_consumed_on_injection(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.cmdty_consumed_on_injection = value.into();
        self
    }

    /// Fraction of withdrawn volume burnt as fuel.
    pub fn cmdty_consumed_on_withdrawal(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.cmdty_consumed_on_withdrawal = value.into();
        self
    }

    /// Fraction of inventory lost each period.
    pub fn inventory_loss(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.inventory_loss = value.into();
        self
    }

    /// Holding cost per unit of inventory per period.
    pub fn inventory_cost(mut self, value: impl Into<PeriodValue<T>>) -> Self {
        self.inventory_cost = value.into();
        self
    }

    /// Payoff of inventory left in the end period as a function of `(price, inventory)`.
    ///
    /// Without one the storage must be empty at the end.
    pub fn terminal_storage_npv<F>(mut self, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.terminal_storage_npv = Some(Arc::new(f));
        self
    }

    /// Validates and builds a [`StorageContract`].
    pub fn build(self) -> Result<StorageContract<T>, ValuationError> {
        let (start, end) = (self.start, self.end);
        if end < start {
            return Err(ValuationError::InvalidInput(
                "storage end period cannot be before start period".to_string(),
            ));
        }

        let constraints = match self.ratchets {
            Some((tables, interpolation)) => {
                for (name, provided) in [
                    ("min_inventory", self.min_inventory.is_some()),
                    ("max_inventory", self.max_inventory.is_some()),
                    ("max_injection_rate", self.max_injection_rate.is_some()),
                    ("max_withdrawal_rate", self.max_withdrawal_rate.is_some()),
                ] {
                    if provided {
                        return Err(ValuationError::InvalidInput(format!(
                            "{name} should not be provided if ratchets are provided"
                        )));
                    }
                }
                validate_ratchet_tables(&tables, start)?;
                Constraints::Ratchets {
                    tables,
                    interpolation,
                }
            }
            None => {
                let required = |value: Option<PeriodValue<T>>, name: &str| {
                    value.ok_or_else(|| {
                        ValuationError::InvalidInput(format!(
                            "{name} must be provided if ratchets are not provided"
                        ))
                    })
                };
                let min_inventory = required(self.min_inventory, "min_inventory")?;
                let max_inventory = required(self.max_inventory, "max_inventory")?;
                let max_injection_rate = required(self.max_injection_rate, "max_injection_rate")?;
                let max_withdrawal_rate =
                    required(self.max_withdrawal_rate, "max_withdrawal_rate")?;

                let non_negative = |v: f64| v.is_finite() && v >= 0.0;
                let req = "finite and >= 0";
                min_inventory.validate("min_inventory", start, end, non_negative, req)?;
                max_inventory.validate("max_inventory", start, end, non_negative, req)?;
                max_injection_rate.validate("max_injection_rate", start, end, non_negative, req)?;
                max_withdrawal_rate.validate("max_withdrawal_rate", start, end, non_negative, req)?;

                if let Some(p) = start
                    .range_inclusive(end)
                    .find(|&p| min_inventory.value(p) > max_inventory.value(p))
                {
                    return Err(ValuationError::InvalidInput(format!(
                        "min_inventory exceeds max_inventory in {p}"
                    )));
                }
                Constraints::Constant {
                    min_inventory,
                    max_inventory,
                    max_injection_rate,
                    max_withdrawal_rate,
                }
            }
        };

        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        let fraction = |v: f64| v.is_finite() && (0.0..1.0).contains(&v);
        self.injection_cost
            .validate("injection_cost", start, end, non_negative, "finite and >= 0")?;
        self.withdrawal_cost
            .validate("withdrawal_cost", start, end, non_negative, "finite and >= 0")?;
        self.inventory_cost
            .validate("inventory_cost", start, end, non_negative, "finite and >= 0")?;
        self.cmdty_consumed_on_injection.validate(
            "cmdty_consumed_on_injection",
            start,
            end,
            fraction,
            "in [0, 1)",
        )?;
        self.cmdty_consumed_on_withdrawal.validate(
            "cmdty_consumed_on_withdrawal",
            start,
            end,
            fraction,
            "in [0, 1)",
        )?;
        self.inventory_loss
            .validate("inventory_loss", start, end, fraction, "in [0, 1)")?;

        Ok(StorageContract {
            start,
            end,
            constraints,
            injection_cost: self.injection_cost,
            withdrawal_cost: self.withdrawal_cost,
            cmdty_consumed_on_injection: self.cmdty_consumed_on_injection,
            cmdty_consumed_on_withdrawal: self.cmdty_consumed_on_withdrawal,
            inventory_loss: self.inventory_loss,
            inventory_cost: self.inventory_cost,
            terminal_storage_npv: self.terminal_storage_npv,
        })
    }
}

fn validate_ratchet_tables<T: TimePeriod>(
    tables: &[RatchetTable<T>],
    start: T,
) -> Result<(), ValuationError> {
    let Some(first) = tables.first() else {
        return Err(ValuationError::InvalidInput(
            "ratchets cannot be empty".to_string(),
        ));
    };
    if first.period > start {
        return Err(ValuationError::InvalidInput(format!(
            "first ratchet table starts {} which is after storage start {start}",
            first.period
        )));
    }
    if tables.windows(2).any(|w| w[1].period <= w[0].period) {
        return Err(ValuationError::InvalidInput(
            "ratchet tables must have strictly increasing periods".to_string(),
        ));
    }
    tables.iter().try_for_each(RatchetTable::validate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Day;
    use approx::assert_relative_eq;

    fn day(y: i32, m: u32, d: u32) -> Day {
        Day::from_ymd(y, m, d).unwrap()
    }

    fn default_ratchets() -> Vec<RatchetTable<Day>> {
        vec![
            RatchetTable::new(
                day(2019, 8, 28),
                vec![
                    InventoryRatchet::new(0.0, 150.0, 255.2),
                    InventoryRatchet::new(2000.0, 200.0, 175.0),
                ],
            ),
            RatchetTable::new(
                day(2019, 9, 10),
                vec![
                    InventoryRatchet::new(0.0, 170.5, 235.8),
                    InventoryRatchet::new(700.0, 180.2, 200.77),
                    InventoryRatchet::new(1800.0, 190.5, 174.45),
                ],
            ),
        ]
    }

    fn constant_storage() -> StorageContract<Day> {
        StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .min_inventory(2.54)
            .max_inventory(1234.56)
            .max_injection_rate(65.64)
            .max_withdrawal_rate(107.07)
            .injection_cost(0.015)
            .withdrawal_cost(0.02)
            .inventory_cost(0.002)
            .cmdty_consumed_on_injection(0.0001)
            .terminal_storage_npv(|price, inventory| price * inventory - 15.4)
            .build()
            .unwrap()
    }

    #[test]
    fn ratchet_linear_interpolation_uses_pillar_mean() {
        let storage = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(default_ratchets(), RatchetInterpolation::Linear)
            .build()
            .unwrap();
        let range = storage.inject_withdraw_range(day(2019, 8, 29), 1000.0);
        assert_relative_eq!(range.min_inject_withdraw, -175.0, epsilon = 1e-12);
        assert_relative_eq!(range.max_inject_withdraw, (255.2 + 175.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn ratchet_step_interpolation_uses_lower_pillar() {
        let storage = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(default_ratchets(), RatchetInterpolation::Step)
            .build()
            .unwrap();
        let range = storage.inject_withdraw_range(day(2019, 9, 12), 1000.0);
        assert_relative_eq!(range.min_inject_withdraw, -180.2);
        assert_relative_eq!(range.max_inject_withdraw, 200.77);
    }

    #[test]
    fn ratchet_tables_define_inventory_bounds() {
        let storage = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(default_ratchets(), RatchetInterpolation::Linear)
            .terminal_storage_npv(|_, _| 0.0)
            .build()
            .unwrap();
        assert_relative_eq!(storage.max_inventory(day(2019, 8, 29)), 2000.0);
        assert_relative_eq!(storage.max_inventory(day(2019, 9, 11)), 1800.0);
        assert_relative_eq!(storage.min_inventory(day(2019, 9, 11)), 0.0);
    }

    #[test]
    fn breakpoints_are_pillars_of_the_active_table() {
        let storage = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(default_ratchets(), RatchetInterpolation::Step)
            .build()
            .unwrap();
        assert_eq!(storage.inject_withdraw_breakpoints(day(2019, 9, 9)), vec![0.0, 2000.0]);
        assert_eq!(
            storage.inject_withdraw_breakpoints(day(2019, 9, 10)),
            vec![0.0, 700.0, 1800.0]
        );
        assert!(constant_storage().inject_withdraw_breakpoints(day(2019, 9, 1)).is_empty());
    }

    #[test]
    fn constant_terms_and_cash_flows() {
        let storage = constant_storage();
        let d = day(2019, 9, 1);
        let range = storage.inject_withdraw_range(d, 500.58);
        assert_relative_eq!(range.min_inject_withdraw, -107.07);
        assert_relative_eq!(range.max_inject_withdraw, 65.64);

        let cost = storage.injection_cost(d, 100.0, 20.0);
        assert_eq!(cost.len(), 1);
        assert_eq!(cost[0].date, d.date());
        assert_relative_eq!(cost[0].amount, 0.3, epsilon = 1e-12);
        assert_relative_eq!(storage.inventory_cost(d, 1000.0)[0].amount, 2.0, epsilon = 1e-12);
        assert_relative_eq!(storage.cmdty_volume_consumed_on_inject(d, 0.0, 10_000.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(storage.cmdty_volume_consumed_on_withdraw(d, 0.0, 10_000.0), 0.0);
        assert!(!storage.must_be_empty_at_end());
        assert_relative_eq!(storage.terminal_storage_npv(2.0, 100.0), 184.6, epsilon = 1e-12);
    }

    #[test]
    fn no_terminal_function_means_empty_at_end() {
        let storage = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap();
        assert!(storage.must_be_empty_at_end());
        assert_eq!(storage.terminal_storage_npv(50.0, 1800.0), 0.0);
        assert_eq!(storage.max_inventory(day(2019, 9, 25)), 0.0);
        assert_eq!(storage.max_inventory(day(2019, 9, 24)), 100.0);
    }

    #[test]
    fn series_terms_vary_by_period() {
        let start = day(2019, 8, 28);
        let end = day(2019, 9, 25);
        let min_inv = TimeSeries::from_fn(start, end, |d| if d < day(2019, 9, 1) { 2.4 } else { 1.2 });
        let storage = StorageContract::builder(start, end)
            .min_inventory(min_inv)
            .max_inventory(1250.5)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap();
        assert_relative_eq!(storage.min_inventory(day(2019, 8, 29)), 2.4);
        assert_relative_eq!(storage.min_inventory(day(2019, 9, 11)), 1.2);
    }

    #[test]
    fn mixing_ratchets_and_constant_constraints_is_rejected() {
        let err = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(default_ratchets(), RatchetInterpolation::Linear)
            .min_inventory(0.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValuationError::InvalidInput(
                "min_inventory should not be provided if ratchets are provided".to_string()
            )
        );
    }

    #[test]
    fn missing_constraints_are_rejected() {
        let err = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_withdrawal_rate must be provided"));
    }

    #[test]
    fn invalid_terms_are_rejected() {
        let base = || {
            StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
                .min_inventory(0.0)
                .max_inventory(100.0)
                .max_injection_rate(10.0)
                .max_withdrawal_rate(10.0)
        };
        assert!(base().max_injection_rate(-1.0).build().is_err());
        assert!(base().inventory_loss(1.0).build().is_err());
        assert!(base().min_inventory(200.0).build().is_err());

        let short = TimeSeries::new(day(2019, 8, 28), vec![0.01; 3]);
        assert!(base().injection_cost(short).build().is_err());

        let unordered = vec![RatchetTable::new(
            day(2019, 8, 28),
            vec![
                InventoryRatchet::new(100.0, 1.0, 1.0),
                InventoryRatchet::new(50.0, 1.0, 1.0),
            ],
        )];
        let err = StorageContract::builder(day(2019, 8, 28), day(2019, 9, 25))
            .ratchets(unordered, RatchetInterpolation::Step)
            .build();
        assert!(matches!(err, Err(ValuationError::InvalidInput(_))));
    }
}
