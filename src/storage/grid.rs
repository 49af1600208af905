//! Inventory discretization strategies.

use serde::{Deserialize, Serialize};

use crate::core::{InventoryRange, ValuationError};
use crate::storage::CmdtyStorage;
use crate::time::TimePeriod;

/// Produces the inventories at which a period's value function is evaluated.
pub trait InventoryGrid: std::fmt::Debug + Send + Sync {
    /// Strictly increasing points spanning `range`, both ends included.
    ///
    /// A degenerate range yields the single point `range.min`.
    fn grid_points(&self, range: InventoryRange) -> Vec<f64>;
}

/// Interval ends plus every multiple of `spacing` strictly between them.
///
/// Aligning interior points on multiples keeps grids of neighbouring periods on the
/// same lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSpacingGrid {
    spacing: f64,
}

impl FixedSpacingGrid {
    pub fn new(spacing: f64) -> Result<Self, ValuationError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ValuationError::InvalidInput(
                "grid spacing must be finite and > 0".to_string(),
            ));
        }
        Ok(Self { spacing })
    }

    /// Spacing that splits the storage's widest inventory range into `num_points`
    /// points.
    pub fn on_global_range<T, S>(storage: &S, num_points: usize) -> Result<Self, ValuationError>
    where
        T: TimePeriod,
        S: CmdtyStorage<T> + ?Sized,
    {
        if num_points < 2 {
            return Err(ValuationError::InvalidInput(
                "grid num_points must be >= 2".to_string(),
            ));
        }
        let periods = storage.start_period().range_inclusive(storage.end_period());
        let (global_min, global_max) = periods.fold((f64::INFINITY, f64::NEG_INFINITY), |acc, p| {
            (
                acc.0.min(storage.min_inventory(p)),
                acc.1.max(storage.max_inventory(p)),
            )
        });
        let width = global_max - global_min;
        if !width.is_finite() || width <= 0.0 {
            return Self::new(1.0);
        }
        Self::new(width / (num_points - 1) as f64)
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }
}

impl InventoryGrid for FixedSpacingGrid {
    fn grid_points(&self, range: InventoryRange) -> Vec<f64> {
        if range.max <= range.min {
            return vec![range.min];
        }
        // Interior points closer than this to an end would only duplicate it.
        let gap = self.spacing * 1e-9;
        let mut points = vec![range.min];
        let mut k = (range.min / self.spacing).floor() + 1.0;
        loop {
            let x = k * self.spacing;
            if x >= range.max - gap {
                break;
            }
            if x > range.min + gap {
                points.push(x);
            }
            k += 1.0;
        }
        points.push(range.max);
        points
    }
}

/// `num_points` evenly spaced points per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointsGrid {
    num_points: usize,
}

impl FixedPointsGrid {
    pub fn new(num_points: usize) -> Result<Self, ValuationError> {
        if num_points < 2 {
            return Err(ValuationError::InvalidInput(
                "grid num_points must be >= 2".to_string(),
            ));
        }
        Ok(Self { num_points })
    }
}

impl InventoryGrid for FixedPointsGrid {
    fn grid_points(&self, range: InventoryRange) -> Vec<f64> {
        if range.max <= range.min {
            return vec![range.min];
        }
        let step = range.width() / (self.num_points - 1) as f64;
        let mut points: Vec<f64> = (0..self.num_points - 1)
            .map(|i| range.min + step * i as f64)
            .collect();
        points.push(range.max);
        points
    }
}

/// Grid strategy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridKind {
    /// [`FixedSpacingGrid::on_global_range`].
    GlobalRange { num_points: usize },
    FixedSpacing { spacing: f64 },
    FixedPoints { num_points: usize },
}

impl Default for GridKind {
    fn default() -> Self {
        Self::GlobalRange { num_points: 100 }
    }
}

impl GridKind {
    pub fn validate(&self) -> Result<(), ValuationError> {
        match *self {
            Self::GlobalRange { num_points } | Self::FixedPoints { num_points } => {
                if num_points < 2 {
                    return Err(ValuationError::InvalidInput(
                        "grid num_points must be >= 2".to_string(),
                    ));
                }
                Ok(())
            }
            Self::FixedSpacing { spacing } => FixedSpacingGrid::new(spacing).map(|_| ()),
        }
    }

    /// Builds the grid for `storage`.
    pub fn build<T, S>(&self, storage: &S) -> Result<Box<dyn InventoryGrid>, ValuationError>
    where
        T: TimePeriod,
        S: CmdtyStorage<T> + ?Sized,
    {
        Ok(match *self {
            Self::GlobalRange { num_points } => {
                Box::new(FixedSpacingGrid::on_global_range::<T, S>(storage, num_points)?)
            }
            Self::FixedSpacing { spacing } => Box::new(FixedSpacingGrid::new(spacing)?),
            Self::FixedPoints { num_points } => Box::new(FixedPointsGrid::new(num_points)?),
        })
    }
}
