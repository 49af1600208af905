//! Core traits, common domain types, and library-wide result/error structures.

pub mod engine;
pub mod serialization;
pub mod types;

pub use engine::StorageValuationEngine;
pub use serialization::{from_json, to_json, to_json_pretty};
pub use types::*;

use crate::math::MathError;
use crate::math::interpolation::InterpolationError;

/// Valuation errors surfaced by the API.
///
/// `Infeasible` is the domain signal that no decision path satisfies the storage
/// constraints; retrying with the same inputs cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuationError {
    /// Input validation error (missing, negative or non-positive configuration).
    InvalidInput(String),
    /// Required market datum is unavailable, e.g. forward curve coverage gaps.
    MarketDataMissing(String),
    /// Inventory constraints cannot be fulfilled.
    Infeasible(String),
    /// Numerical issue (non-finite value, interpolation failure, etc.).
    NumericalError(String),
}

impl ValuationError {
    /// Returns true for the constraint-infeasibility variant.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible(_))
    }
}

impl std::fmt::Display for ValuationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::MarketDataMissing(msg) => write!(f, "market data missing: {msg}"),
            Self::Infeasible(msg) => write!(f, "inventory constraints cannot be fulfilled: {msg}"),
            Self::NumericalError(msg) => write!(f, "numerical error: {msg}"),
        }
    }
}

impl std::error::Error for ValuationError {}

impl From<InterpolationError> for ValuationError {
    fn from(err: InterpolationError) -> Self {
        match err {
            InterpolationError::InvalidInput(msg) => Self::InvalidInput(msg.to_string()),
            InterpolationError::ExtrapolationDisabled => Self::NumericalError(
                "continuation value queried outside the inventory grid".to_string(),
            ),
        }
    }
}

impl From<MathError> for ValuationError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => Self::InvalidInput(msg.to_string()),
            MathError::NonConvergence => {
                Self::NumericalError("root finder did not converge".to_string())
            }
            MathError::NoBracket => {
                Self::NumericalError("root finder bounds do not bracket a root".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_variant() {
        let err = ValuationError::Infeasible("storage must be empty".to_string());
        assert_eq!(
            err.to_string(),
            "inventory constraints cannot be fulfilled: storage must be empty"
        );
        assert!(err.is_infeasible());
        assert!(!ValuationError::InvalidInput("x".to_string()).is_infeasible());
    }

    #[test]
    fn interpolation_errors_convert() {
        let err: ValuationError = InterpolationError::InvalidInput("x must be finite").into();
        assert_eq!(err, ValuationError::InvalidInput("x must be finite".to_string()));
    }
}
