//! # Peregrine-Match
//!
//! A price-time priority limit order matching engine with an arena-backed
//! book and a lock-free hot path.
//!
//! ## Design Principles
//!
//! - **Single-Owner**: one task owns the book exclusively (no locks)
//! - **Arena Allocation**: resting orders live in a pre-allocated pool;
//!   the matching path never touches the heap
//! - **Dense Price Levels**: one slot per discrete price across a bounded
//!   domain, indexed by `price - min_price`
//! - **Channel Pipeline**: unbounded MPSC in, unbounded SPSC out, trades
//!   forwarded in exact generation order
//!
//! ## Architecture
//!
//! ```text
//! [Intake] --> [Order Queue] --> [Matching Loop] --> [Trade Queue] --> [Publisher]
//!                                      |
//!                               [Stats Reporter]
//! ```

pub mod error;
pub mod feed;
pub mod order_book;
pub mod pipeline;
pub mod pool;
pub mod price_level;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use error::{EnqueueError, OrderError};
pub use order_book::{BookConfig, OrderBook};
pub use pipeline::{
    pin_to_last_core, EngineHandle, LogPublisher, MatchingPipeline, PipelineConfig, PublishError,
    TradePublisher,
};
pub use pool::{OrderNode, OrderPool, PoolIndex, NULL_INDEX};
pub use price_level::PriceLevel;
pub use stats::{EngineStats, StatsSnapshot};
pub use types::{Order, Side, Trade};
