//! Pipeline instrumentation counters.
//!
//! An explicitly constructed handle shared by the matching loop (sole
//! writer) and any reporter (readers). Counters are monotonic; snapshots
//! are approximate and meant for dashboards, not settlement.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for orders processed and trades created.
#[derive(Debug, Default)]
pub struct EngineStats {
    orders_processed: AtomicU64,
    trades_created: AtomicU64,
}

/// A point-in-time read of the counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub orders_processed: u64,
    pub trades_created: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_order(&self) {
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_trade(&self) {
        self.trades_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_processed: self.orders_processed.load(Ordering::Relaxed),
            trades_created: self.trades_created.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = EngineStats::new();
        assert_eq!(stats.snapshot().orders_processed, 0);

        stats.record_order();
        stats.record_order();
        stats.record_trade();

        let snap = stats.snapshot();
        assert_eq!(snap.orders_processed, 2);
        assert_eq!(snap.trades_created, 1);
    }
}
