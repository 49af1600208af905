//! Intrinsic storage valuation: optimal operation under a forward curve assumed to
//! be realised with certainty.

mod config;
mod engine;
mod request;

pub use config::IntrinsicConfig;
pub use engine::IntrinsicEngine;
pub use request::{IntrinsicValuation, IntrinsicValuationBuilder};
