use serde::{Deserialize, Serialize};

use crate::core::ValuationError;
use crate::math::InterpolationKind;
use crate::storage::GridKind;

/// Numerical settings of the intrinsic engine, loadable from JSON.
///
/// Missing fields take their defaults:
///
/// ```rust
/// use storage_valuation::engines::IntrinsicConfig;
/// use storage_valuation::storage::GridKind;
///
/// let cfg = IntrinsicConfig::from_json(r#"{"grid": {"type": "fixed_spacing", "spacing": 5.0}}"#)
///     .unwrap();
/// assert_eq!(cfg.grid, GridKind::FixedSpacing { spacing: 5.0 });
/// assert_eq!(cfg.numerical_tolerance, 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrinsicConfig {
    /// Slack allowed when testing inventory-bound membership.
    pub numerical_tolerance: f64,
    pub grid: GridKind,
    pub interpolation: InterpolationKind,
}

impl Default for IntrinsicConfig {
    fn default() -> Self {
        Self {
            numerical_tolerance: 1e-10,
            grid: GridKind::default(),
            interpolation: InterpolationKind::default(),
        }
    }
}

impl IntrinsicConfig {
    pub fn validate(&self) -> Result<(), ValuationError> {
        if !self.numerical_tolerance.is_finite() || self.numerical_tolerance <= 0.0 {
            return Err(ValuationError::InvalidInput(
                "numerical tolerance must be finite and > 0".to_string(),
            ));
        }
        self.grid.validate()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(payload: &str) -> Result<Self, ValuationError> {
        let cfg: Self = crate::core::from_json(payload)
            .map_err(|e| ValuationError::InvalidInput(format!("intrinsic config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::to_json;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = IntrinsicConfig::default();
        assert_eq!(cfg.numerical_tolerance, 1e-10);
        assert_eq!(cfg.grid, GridKind::GlobalRange { num_points: 100 });
        assert_eq!(cfg.interpolation, InterpolationKind::Linear);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn json_round_trip_keeps_strategies() {
        let cfg = IntrinsicConfig {
            numerical_tolerance: 1e-8,
            grid: GridKind::FixedPoints { num_points: 21 },
            interpolation: InterpolationKind::HermiteMonotone,
        };
        let json = to_json(&cfg).unwrap();
        assert!(json.contains("\"hermite_monotone\""));
        assert_eq!(IntrinsicConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let err = IntrinsicConfig::from_json(r#"{"numerical_tolerance": 0.0}"#).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput(_)));
        assert!(IntrinsicConfig::from_json("{not json").is_err());
    }
}
