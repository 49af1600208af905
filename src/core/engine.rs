use crate::core::{ValuationError, ValuationResult};
use crate::time::TimePeriod;

/// Valuation engine abstraction over a storage valuation request.
pub trait StorageValuationEngine<T: TimePeriod> {
    /// Request type carrying storage, market data and numerical settings.
    type Request;

    /// Values the storage and returns the optimal decision profile.
    fn value(&self, request: &Self::Request) -> Result<ValuationResult<T>, ValuationError>;
}
