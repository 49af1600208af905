//! Serde payloads and JSON helpers for valuation inputs and outputs.
//!
//! # Examples
//! ```rust
//! use storage_valuation::core::{from_json, to_json_pretty, ValuationResult};
//! use storage_valuation::engines::IntrinsicConfig;
//! use storage_valuation::time::Day;
//!
//! let config: IntrinsicConfig =
//!     from_json(r#"{"grid":{"type":"fixed_spacing","spacing":10.0}}"#).expect("json deserialization");
//! assert_eq!(config.numerical_tolerance, 1e-10);
//!
//! let result = ValuationResult::<Day>::empty();
//! let json = to_json_pretty(&result).expect("json serialization");
//! let decoded: ValuationResult<Day> = from_json(&json).expect("json deserialization");
//! assert_eq!(decoded, result);
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize a value to compact JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Serialize a value to pretty JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
