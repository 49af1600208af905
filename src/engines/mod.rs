//! Storage valuation engine implementations.

pub mod intrinsic;

pub use intrinsic::{IntrinsicConfig, IntrinsicEngine, IntrinsicValuation, IntrinsicValuationBuilder};
