//! Backward induction over discretized inventory, followed by a forward replay.
//!
//! The sweep builds one continuation-value function per period from the storage
//! end backwards. The replay then walks forward from the actual starting inventory,
//! re-deriving the optimal decision from those functions.
//!
//! All cash flows are discounted to the first day of the current period.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::core::{
    DomesticCashFlow, InventoryRange, StorageProfile, StorageValuationEngine, ValuationError,
    ValuationResult,
};
use crate::engines::intrinsic::IntrinsicValuation;
use crate::math::{ExtrapolationMode, Interpolator, max_value_and_index};
use crate::rates::DiscountFactorCache;
use crate::storage::{CmdtyStorage, bang_bang_decision_set, inventory_space};
use crate::time::{TimePeriod, TimeSeries};

/// Deterministic-curve storage valuation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicEngine;

impl IntrinsicEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Storage value from a period onwards as a function of inventory.
enum ValueFunction {
    /// Terminal payoff at the end-period price; closed form, never discretized.
    Terminal { cmdty_price: f64 },
    Interpolated(Box<dyn Interpolator>),
}

impl ValueFunction {
    fn value<T: TimePeriod>(
        &self,
        storage: &dyn CmdtyStorage<T>,
        inventory: f64,
    ) -> Result<f64, ValuationError> {
        match self {
            Self::Terminal { cmdty_price } => {
                Ok(storage.terminal_storage_npv(*cmdty_price, inventory))
            }
            Self::Interpolated(interpolator) => Ok(interpolator.value(inventory)?),
        }
    }
}

/// Optimal decision at one inventory.
#[derive(Debug, Clone, Copy)]
struct Decision {
    inject_withdraw_volume: f64,
    cmdty_consumed: f64,
    inventory_loss: f64,
    period_pv: f64,
    /// Period PV plus continuation value.
    storage_npv: f64,
}

/// Inputs shared by every inventory evaluated in one period.
struct PeriodStep<'a, T: TimePeriod> {
    storage: &'a dyn CmdtyStorage<T>,
    period: T,
    cmdty_price: f64,
    settlement_discount_factor: f64,
    next_space: InventoryRange,
    continuation: &'a ValueFunction,
    discount_factors: &'a DiscountFactorCache<'a>,
    tolerance: f64,
}

impl<T: TimePeriod> PeriodStep<'_, T> {
    fn present_value(&self, cash_flows: &[DomesticCashFlow]) -> Result<f64, ValuationError> {
        cash_flows.iter().try_fold(0.0, |acc, cf| {
            Ok(acc + cf.amount * self.discount_factors.discount_factor(cf.date)?)
        })
    }

    fn optimal_decision(&self, inventory: f64) -> Result<Decision, ValuationError> {
        let storage = self.storage;
        let period = self.period;
        let range = storage.inject_withdraw_range(period, inventory);
        let inventory_loss = storage.inventory_percent_loss(period) * inventory;
        let decisions = bang_bang_decision_set(
            range,
            inventory,
            inventory_loss,
            self.next_space.min,
            self.next_space.max,
            self.tolerance,
        )?;
        let inventory_cost_pv = self.present_value(&storage.inventory_cost(period, inventory))?;

        let mut evaluated = Vec::with_capacity(decisions.len());
        for &volume in &decisions {
            let (decision_cost, cmdty_consumed) = if volume > 0.0 {
                (
                    storage.injection_cost(period, inventory, volume),
                    storage.cmdty_volume_consumed_on_inject(period, inventory, volume),
                )
            } else {
                (
                    storage.withdrawal_cost(period, inventory, -volume),
                    storage.cmdty_volume_consumed_on_withdraw(period, inventory, -volume),
                )
            };
            let decision_cost_pv = self.present_value(&decision_cost)?;
            // Consumed volumes are traded on top of the decision volume.
            let traded_pv =
                -(volume + cmdty_consumed) * self.cmdty_price * self.settlement_discount_factor;
            let period_pv = traded_pv - decision_cost_pv - inventory_cost_pv;

            let inventory_after = inventory + volume - inventory_loss;
            let continuation = self.continuation.value(storage, inventory_after)?;
            evaluated.push(Decision {
                inject_withdraw_volume: volume,
                cmdty_consumed,
                inventory_loss,
                period_pv,
                storage_npv: period_pv + continuation,
            });
        }

        let values: Vec<f64> = evaluated.iter().map(|d| d.storage_npv).collect();
        let (_, best) = max_value_and_index(&values).ok_or_else(|| {
            ValuationError::NumericalError(format!(
                "no finite decision value at inventory {inventory} in {period}"
            ))
        })?;
        let decision = evaluated[best];
        trace!(
            period = %period,
            inventory,
            volume = decision.inject_withdraw_volume,
            value = decision.storage_npv,
            "optimal decision"
        );
        Ok(decision)
    }
}

fn terminal_only<T: TimePeriod>(
    request: &IntrinsicValuation<T>,
) -> Result<ValuationResult<T>, ValuationError> {
    let storage = request.storage();
    let inventory = request.starting_inventory;
    let end = storage.end_period();

    if storage.must_be_empty_at_end() {
        if inventory > 0.0 {
            return Err(ValuationError::Infeasible(
                "storage must be empty at end, but inventory is greater than zero".to_string(),
            ));
        }
        return Ok(ValuationResult::empty());
    }
    if inventory < storage.min_inventory(end) {
        return Err(ValuationError::Infeasible(
            "current inventory is lower than the minimum allowed in the end period".to_string(),
        ));
    }
    if inventory > storage.max_inventory(end) {
        return Err(ValuationError::Infeasible(
            "current inventory is greater than the maximum allowed in the end period".to_string(),
        ));
    }
    let cmdty_price = *request.forward_curve.try_get(end)?;
    Ok(ValuationResult::new(
        storage.terminal_storage_npv(cmdty_price, inventory),
        TimeSeries::empty(),
    ))
}

fn check_curve_coverage<T: TimePeriod>(
    curve: &TimeSeries<T, f64>,
    first: T,
    last: T,
) -> Result<(), ValuationError> {
    let (Some(start), Some(end)) = (curve.start(), curve.end()) else {
        return Err(ValuationError::MarketDataMissing(
            "forward curve cannot be empty".to_string(),
        ));
    };
    if start > first {
        return Err(ValuationError::MarketDataMissing(format!(
            "forward curve starts at {start}, after {first}"
        )));
    }
    if end < last {
        return Err(ValuationError::MarketDataMissing(format!(
            "forward curve ends at {end}, before storage end period {last}"
        )));
    }
    if let Some((period, _)) = curve.iter().find(|(_, price)| !price.is_finite()) {
        return Err(ValuationError::InvalidInput(format!(
            "forward price for {period} is not finite"
        )));
    }
    Ok(())
}

impl<T: TimePeriod> StorageValuationEngine<T> for IntrinsicEngine {
    type Request = IntrinsicValuation<T>;

    fn value(&self, request: &Self::Request) -> Result<ValuationResult<T>, ValuationError> {
        let storage = request.storage();
        let current = request.current_period;
        let end = storage.end_period();
        let tolerance = request.config.numerical_tolerance;

        if current > end {
            debug!(current = %current, end = %end, "storage already expired");
            return Ok(ValuationResult::empty());
        }
        if current == end {
            return terminal_only(request);
        }

        check_curve_coverage(&request.forward_curve, current, end)?;
        let curve = &request.forward_curve;

        let space = inventory_space(storage, request.starting_inventory, current)?;
        if let Some((period, range)) = space.iter().find(|(_, r)| r.is_empty(tolerance)) {
            return Err(ValuationError::Infeasible(format!(
                "no reachable inventory in {period}: min {} exceeds max {}",
                range.min, range.max
            )));
        }

        let discount_factors =
            DiscountFactorCache::new(current.first_day(), request.discount_factors.as_ref());
        let grid = match &request.inventory_grid {
            Some(grid) => grid.clone(),
            None => request.config.grid.build::<T, _>(storage)?.into(),
        };
        let interpolator_factory = match &request.interpolator_factory {
            Some(factory) => factory.clone(),
            None => request
                .config
                .interpolation
                .factory(ExtrapolationMode::Linear)
                .into(),
        };

        let space_range = |period: T| -> Result<InventoryRange, ValuationError> {
            space.get(period).copied().ok_or_else(|| {
                ValuationError::NumericalError(format!("inventory space missing {period}"))
            })
        };

        // value_functions[i] is the value from period current + 1 + i onwards.
        let mut value_functions = Vec::with_capacity(space.len());
        value_functions.push(ValueFunction::Terminal {
            cmdty_price: *curve.try_get(end)?,
        });

        for period in current.next().range_inclusive(end.previous()).rev() {
            let grid_points = grid.grid_points(space_range(period)?);
            let step = PeriodStep {
                storage,
                period,
                cmdty_price: *curve.try_get(period)?,
                settlement_discount_factor: discount_factors
                    .discount_factor(request.settlement_rule.settlement_day(period))?,
                next_space: space_range(period.next())?,
                continuation: value_functions
                    .last()
                    .ok_or_else(|| ValuationError::NumericalError("no continuation".to_string()))?,
                discount_factors: &discount_factors,
                tolerance,
            };

            #[cfg(feature = "parallel")]
            let values = grid_points
                .par_iter()
                .map(|&inventory| step.optimal_decision(inventory).map(|d| d.storage_npv))
                .collect::<Result<Vec<_>, _>>()?;
            #[cfg(not(feature = "parallel"))]
            let values = grid_points
                .iter()
                .map(|&inventory| step.optimal_decision(inventory).map(|d| d.storage_npv))
                .collect::<Result<Vec<_>, _>>()?;

            debug!(period = %period, grid_points = grid_points.len(), "backward sweep");
            let interpolator = interpolator_factory.create(grid_points, values)?;
            value_functions.push(ValueFunction::Interpolated(interpolator));
        }
        value_functions.reverse();

        let mut inventory = request.starting_inventory;
        let mut profiles = Vec::with_capacity(space.len() + 1);
        for (idx, period) in current.range_inclusive(end).enumerate() {
            if period == end {
                let period_pv = if storage.must_be_empty_at_end() {
                    0.0
                } else {
                    storage.terminal_storage_npv(*curve.try_get(end)?, inventory)
                };
                profiles.push(StorageProfile {
                    inventory,
                    inject_withdraw_volume: 0.0,
                    cmdty_consumed: 0.0,
                    inventory_loss: 0.0,
                    period_pv,
                });
                continue;
            }

            let step = PeriodStep {
                storage,
                period,
                cmdty_price: *curve.try_get(period)?,
                settlement_discount_factor: discount_factors
                    .discount_factor(request.settlement_rule.settlement_day(period))?,
                next_space: space_range(period.next())?,
                continuation: &value_functions[idx],
                discount_factors: &discount_factors,
                tolerance,
            };
            let decision = step.optimal_decision(inventory)?;
            inventory += decision.inject_withdraw_volume - decision.inventory_loss;
            profiles.push(StorageProfile {
                inventory,
                inject_withdraw_volume: decision.inject_withdraw_volume,
                cmdty_consumed: decision.cmdty_consumed,
                inventory_loss: decision.inventory_loss,
                period_pv: decision.period_pv,
            });
        }

        let net_present_value: f64 = profiles.iter().map(|p| p.period_pv).sum();
        if !net_present_value.is_finite() {
            return Err(ValuationError::NumericalError(
                "storage value is not finite".to_string(),
            ));
        }
        info!(
            current = %current,
            end = %end,
            npv = net_present_value,
            discount_factors_cached = discount_factors.len(),
            "intrinsic valuation complete"
        );
        Ok(ValuationResult::new(
            net_present_value,
            TimeSeries::new(current, profiles),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{FirstDayOfPeriod, FlatRateDiscounting, NoDiscounting};
    use crate::storage::StorageContract;
    use crate::time::Day;
    use approx::assert_relative_eq;

    fn d0() -> Day {
        Day::from_ymd(2019, 9, 2).unwrap()
    }

    fn two_period_storage() -> StorageContract<Day> {
        StorageContract::builder(d0(), d0().offset(2))
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .build()
            .unwrap()
    }

    fn request(
        storage: StorageContract<Day>,
        current: Day,
        inventory: f64,
        prices: Vec<f64>,
    ) -> IntrinsicValuation<Day> {
        IntrinsicValuation::builder()
            .storage(storage)
            .current_period(current)
            .starting_inventory(inventory)
            .forward_curve(TimeSeries::new(d0(), prices))
            .settlement_rule(FirstDayOfPeriod)
            .discount_factors(NoDiscounting)
            .build()
            .unwrap()
    }

    #[test]
    fn buys_low_sells_high_over_two_periods() {
        let req = request(two_period_storage(), d0(), 0.0, vec![10.0, 15.0, 20.0]);
        let result = IntrinsicEngine::new().value(&req).unwrap();

        assert_relative_eq!(result.net_present_value, 50.0, epsilon = 1e-9);
        let profile = result.profile.values();
        assert_eq!(profile.len(), 3);
        assert_relative_eq!(profile[0].inject_withdraw_volume, 10.0, epsilon = 1e-9);
        assert_relative_eq!(profile[0].inventory, 10.0, epsilon = 1e-9);
        assert_relative_eq!(profile[0].period_pv, -100.0, epsilon = 1e-9);
        assert_relative_eq!(profile[1].inject_withdraw_volume, -10.0, epsilon = 1e-9);
        assert_relative_eq!(profile[1].period_pv, 150.0, epsilon = 1e-9);
        assert_relative_eq!(profile[2].inventory, 0.0, epsilon = 1e-9);
        assert_eq!(profile[2].period_pv, 0.0);
    }

    #[test]
    fn discounts_to_first_day_of_current_period() {
        let mut req = request(two_period_storage(), d0(), 0.0, vec![10.0, 15.0, 20.0]);
        req.discount_factors = std::sync::Arc::new(FlatRateDiscounting::new(0.05));
        let result = req.calculate().unwrap();
        let df = (-0.05_f64 / 365.0).exp();
        assert_relative_eq!(result.net_present_value, -100.0 + 150.0 * df, epsilon = 1e-9);
    }

    #[test]
    fn expired_storage_is_worthless() {
        let req = request(two_period_storage(), d0().offset(3), 0.0, vec![10.0; 4]);
        let result = req.calculate().unwrap();
        assert_eq!(result, ValuationResult::empty());
    }

    #[test]
    fn end_period_must_be_empty() {
        let end = d0().offset(2);
        let result = request(two_period_storage(), end, 0.0, vec![10.0; 3])
            .calculate()
            .unwrap();
        assert_eq!(result.net_present_value, 0.0);
        assert!(result.profile.is_empty());

        let err = request(two_period_storage(), end, 5.0, vec![10.0; 3])
            .calculate()
            .unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn end_period_pays_terminal_value() {
        let storage = StorageContract::builder(d0(), d0().offset(2))
            .min_inventory(0.0)
            .max_inventory(100.0)
            .max_injection_rate(10.0)
            .max_withdrawal_rate(10.0)
            .terminal_storage_npv(|price, inventory| price * inventory - 1.0)
            .build()
            .unwrap();
        let result = request(storage.clone(), d0().offset(2), 5.0, vec![10.0, 11.0, 12.0])
            .calculate()
            .unwrap();
        assert_relative_eq!(result.net_present_value, 59.0);
        assert!(result.profile.is_empty());

        let err = request(storage, d0().offset(2), 500.0, vec![10.0, 11.0, 12.0])
            .calculate()
            .unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn unreachable_terminal_state_is_infeasible() {
        let err = request(two_period_storage(), d0(), 50.0, vec![10.0; 3])
            .calculate()
            .unwrap_err();
        assert!(matches!(err, ValuationError::Infeasible(_)));
    }

    #[test]
    fn forward_curve_must_cover_horizon() {
        let late = IntrinsicValuation::builder()
            .storage(two_period_storage())
            .current_period(d0())
            .starting_inventory(0.0)
            .forward_curve(TimeSeries::new(d0().next(), vec![10.0; 5]))
            .settlement_rule(FirstDayOfPeriod)
            .discount_factors(NoDiscounting)
            .build()
            .unwrap();
        assert!(matches!(
            late.calculate(),
            Err(ValuationError::MarketDataMissing(_))
        ));

        let short = request(two_period_storage(), d0(), 0.0, vec![10.0, 12.0]);
        assert!(matches!(
            short.calculate(),
            Err(ValuationError::MarketDataMissing(_))
        ));

        let empty = request(two_period_storage(), d0(), 0.0, vec![]);
        assert!(matches!(
            empty.calculate(),
            Err(ValuationError::MarketDataMissing(_))
        ));
    }
}
