use std::fmt;
use std::sync::Arc;

use crate::core::{StorageValuationEngine, ValuationError, ValuationResult};
use crate::engines::intrinsic::{IntrinsicConfig, IntrinsicEngine};
use crate::math::InterpolatorFactory;
use crate::rates::{DiscountFactors, SettlementRule};
use crate::storage::{CmdtyStorage, InventoryGrid};
use crate::time::{TimePeriod, TimeSeries};

/// Everything needed to value one storage under a deterministic forward curve.
///
/// Built with [`IntrinsicValuation::builder`]; every required field is checked on
/// [`build`](IntrinsicValuationBuilder::build).
#[derive(Clone)]
pub struct IntrinsicValuation<T: TimePeriod> {
    pub(crate) storage: Arc<dyn CmdtyStorage<T>>,
    pub(crate) current_period: T,
    pub(crate) starting_inventory: f64,
    pub(crate) forward_curve: TimeSeries<T, f64>,
    pub(crate) settlement_rule: Arc<dyn SettlementRule<T>>,
    pub(crate) discount_factors: Arc<dyn DiscountFactors>,
    pub(crate) inventory_grid: Option<Arc<dyn InventoryGrid>>,
    pub(crate) interpolator_factory: Option<Arc<dyn InterpolatorFactory>>,
    pub(crate) config: IntrinsicConfig,
}

impl<T: TimePeriod> IntrinsicValuation<T> {
    pub fn builder() -> IntrinsicValuationBuilder<T> {
        IntrinsicValuationBuilder::default()
    }

    pub fn storage(&self) -> &dyn CmdtyStorage<T> {
        self.storage.as_ref()
    }

    pub fn current_period(&self) -> T {
        self.current_period
    }

    pub fn starting_inventory(&self) -> f64 {
        self.starting_inventory
    }

    pub fn forward_curve(&self) -> &TimeSeries<T, f64> {
        &self.forward_curve
    }

    pub fn config(&self) -> &IntrinsicConfig {
        &self.config
    }

    /// Values the request with the default [`IntrinsicEngine`].
    pub fn calculate(&self) -> Result<ValuationResult<T>, ValuationError> {
        IntrinsicEngine::new().value(self)
    }
}

impl<T: TimePeriod> fmt::Debug for IntrinsicValuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrinsicValuation")
            .field("current_period", &self.current_period)
            .field("starting_inventory", &self.starting_inventory)
            .field("end_period", &self.storage.end_period())
            .field("forward_curve_len", &self.forward_curve.len())
            .field("inventory_grid", &self.inventory_grid)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`IntrinsicValuation`].
pub struct IntrinsicValuationBuilder<T: TimePeriod> {
    storage: Option<Arc<dyn CmdtyStorage<T>>>,
    current_period: Option<T>,
    starting_inventory: Option<f64>,
    forward_curve: Option<TimeSeries<T, f64>>,
    settlement_rule: Option<Arc<dyn SettlementRule<T>>>,
    discount_factors: Option<Arc<dyn DiscountFactors>>,
    inventory_grid: Option<Arc<dyn InventoryGrid>>,
    interpolator_factory: Option<Arc<dyn InterpolatorFactory>>,
    numerical_tolerance: Option<f64>,
    config: IntrinsicConfig,
}

impl<T: TimePeriod> Default for IntrinsicValuationBuilder<T> {
    fn default() -> Self {
        Self {
            storage: None,
            current_period: None,
            starting_inventory: None,
            forward_curve: None,
            settlement_rule: None,
            discount_factors: None,
            inventory_grid: None,
            interpolator_factory: None,
            numerical_tolerance: None,
            config: IntrinsicConfig::default(),
        }
    }
}

impl<T: TimePeriod> IntrinsicValuationBuilder<T> {
    pub fn storage<S>(mut self, storage: S) -> Self
    where
        S: CmdtyStorage<T> + 'static,
    {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Shares a storage already held elsewhere.
    pub fn shared_storage(mut self, storage: Arc<dyn CmdtyStorage<T>>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Period of the first decision; cash flows discount to its first day.
    #[inline]
    pub fn current_period(mut self, period: T) -> Self {
        self.current_period = Some(period);
        self
    }

    #[inline]
    pub fn starting_inventory(mut self, inventory: f64) -> Self {
        self.starting_inventory = Some(inventory);
        self
    }

    pub fn forward_curve(mut self, curve: TimeSeries<T, f64>) -> Self {
        self.forward_curve = Some(curve);
        self
    }

    pub fn settlement_rule<R>(mut self, rule: R) -> Self
    where
        R: SettlementRule<T> + 'static,
    {
        self.settlement_rule = Some(Arc::new(rule));
        self
    }

    pub fn discount_factors<D>(mut self, discount_factors: D) -> Self
    where
        D: DiscountFactors + 'static,
    {
        self.discount_factors = Some(Arc::new(discount_factors));
        self
    }

    /// Overrides the grid strategy from the configuration.
    pub fn inventory_grid<G>(mut self, grid: G) -> Self
    where
        G: InventoryGrid + 'static,
    {
        self.inventory_grid = Some(Arc::new(grid));
        self
    }

    /// Overrides the interpolation scheme from the configuration.
    pub fn interpolator_factory<F>(mut self, factory: F) -> Self
    where
        F: InterpolatorFactory + 'static,
    {
        self.interpolator_factory = Some(Arc::new(factory));
        self
    }

    pub fn numerical_tolerance(mut self, tolerance: f64) -> Self {
        self.numerical_tolerance = Some(tolerance);
        self
    }

    pub fn config(mut self, config: IntrinsicConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates and builds an [`IntrinsicValuation`].
    pub fn build(self) -> Result<IntrinsicValuation<T>, ValuationError> {
        let storage = self.storage.ok_or_else(|| required("storage"))?;
        let current_period = self.current_period.ok_or_else(|| required("current_period"))?;
        let starting_inventory = self
            .starting_inventory
            .ok_or_else(|| required("starting_inventory"))?;
        let forward_curve = self.forward_curve.ok_or_else(|| required("forward_curve"))?;
        let settlement_rule = self
            .settlement_rule
            .ok_or_else(|| required("settlement_rule"))?;
        let discount_factors = self
            .discount_factors
            .ok_or_else(|| required("discount_factors"))?;

        if current_period < storage.start_period() {
            return Err(ValuationError::InvalidInput(format!(
                "current_period {current_period} is before storage start {}",
                storage.start_period()
            )));
        }
        if !starting_inventory.is_finite() || starting_inventory < 0.0 {
            return Err(ValuationError::InvalidInput(
                "starting_inventory must be finite and >= 0".to_string(),
            ));
        }
        let mut config = self.config;
        if let Some(tolerance) = self.numerical_tolerance {
            config.numerical_tolerance = tolerance;
        }
        config.validate()?;

        Ok(IntrinsicValuation {
            storage,
            current_period,
            starting_inventory,
            forward_curve,
            settlement_rule,
            discount_factors,
            inventory_grid: self.inventory_grid,
            interpolator_factory: self.interpolator_factory,
            config,
        })
    }
}

fn required(field: &str) -> ValuationError {
    ValuationError::InvalidInput(format!("intrinsic valuation {field} is required"))
}
