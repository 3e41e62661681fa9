//! Error taxonomy for the admission and pipeline boundaries.
//!
//! Admission and capacity failures are reported synchronously to the
//! caller; transport failures stay inside the publishing loop; free-list
//! or chain corruption is a bug and fails fast with a panic instead of
//! appearing here.

use thiserror::Error;

/// Synchronous rejections returned by
/// [`OrderBook::process_order`](crate::order_book::OrderBook::process_order).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    /// Incoming price falls outside the configured book domain. The book
    /// is untouched and no trade was emitted.
    #[error("price {price} outside book domain [{min}, {max}]")]
    PriceOutOfRange { price: i64, min: i64, max: i64 },

    /// No free pool slot to rest the remainder. Trades already emitted
    /// for this order stand; only the resting step failed.
    #[error("order pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: u32 },
}

/// Submission failures surfaced to intake callers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The pipeline has shut down and no longer accepts orders.
    #[error("matching pipeline is no longer accepting orders")]
    Closed,
}
