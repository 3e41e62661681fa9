//! The concurrency harness around the order book.
//!
//! Three tasks run for the lifetime of the pipeline:
//!
//! - the **matching loop**: sole consumer of the inbound order queue and
//!   sole owner of the book; matches each order to completion before
//!   looking at anything else,
//! - the **publishing loop**: sole consumer of the outbound trade queue;
//!   hands trades to the transport collaborator and contains its failures,
//! - the **stats loop**: periodically logs the shared counters.
//!
//! Queues are unbounded; the book itself is never shared and never
//! locked. Shutdown is cooperative and observed only between whole
//! order-matching calls, so the book is never left mid-mutation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{EnqueueError, OrderError};
use crate::order_book::{BookConfig, OrderBook};
use crate::stats::EngineStats;
use crate::types::{Order, Trade};

/// Error type for publish attempts; transports bring their own.
pub type PublishError = Box<dyn std::error::Error + Send + Sync>;

/// Attempts per trade before the publishing loop drops it.
const PUBLISH_RETRIES: u32 = 3;

/// Initial retry backoff; doubles per attempt.
const PUBLISH_BACKOFF: Duration = Duration::from_millis(10);

/// Destination for matched trades - the transport collaborator seam.
///
/// Trades arrive in generation order. Failures are retried with backoff
/// by the publishing loop and never reach the matching loop.
#[async_trait]
pub trait TradePublisher: Send {
    async fn publish(&mut self, trade: Trade) -> Result<(), PublishError>;
}

/// Publisher that just logs each trade; stands in for a real transport
/// in the simulator and in tests.
pub struct LogPublisher;

#[async_trait]
impl TradePublisher for LogPublisher {
    async fn publish(&mut self, trade: Trade) -> Result<(), PublishError> {
        debug!(
            price = trade.price,
            qty = trade.qty,
            maker = trade.maker_order_id,
            taker = trade.taker_order_id,
            "trade executed"
        );
        Ok(())
    }
}

/// Pipeline tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    pub book: BookConfig,
    /// How often the stats loop logs a counter snapshot
    pub stats_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            book: BookConfig::default(),
            stats_interval: Duration::from_secs(1),
        }
    }
}

/// Cloneable producer handle - the order submission entry point.
#[derive(Clone)]
pub struct EngineHandle {
    orders: mpsc::UnboundedSender<Order>,
    stats: Arc<EngineStats>,
}

impl EngineHandle {
    /// Queue an order for matching. Non-blocking; fails only once the
    /// pipeline has shut down.
    pub fn enqueue_order(&self, order: Order) -> Result<(), EnqueueError> {
        self.orders.send(order).map_err(|_| EnqueueError::Closed)
    }

    /// Shared counters for external reporters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}

/// The running pipeline: spawn once, submit through [`EngineHandle`]
/// clones, shut down to reclaim the book.
pub struct MatchingPipeline {
    handle: EngineHandle,
    shutdown: watch::Sender<bool>,
    matching: JoinHandle<OrderBook>,
    publishing: JoinHandle<()>,
    stats_loop: JoinHandle<()>,
}

impl MatchingPipeline {
    /// Spawn the three pipeline tasks onto the current tokio runtime.
    pub fn spawn<P>(config: PipelineConfig, publisher: P) -> Self
    where
        P: TradePublisher + 'static,
    {
        let stats = Arc::new(EngineStats::new());
        let (order_tx, order_rx) = mpsc::unbounded_channel();
        let (trade_tx, trade_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let book = OrderBook::new(config.book);
        let matching = tokio::spawn(run_matching_loop(
            book,
            order_rx,
            trade_tx,
            Arc::clone(&stats),
            shutdown_rx.clone(),
        ));
        let publishing = tokio::spawn(run_publishing_loop(trade_rx, publisher));
        let stats_loop = tokio::spawn(run_stats_loop(
            Arc::clone(&stats),
            config.stats_interval,
            shutdown_rx,
        ));

        Self {
            handle: EngineHandle {
                orders: order_tx,
                stats,
            },
            shutdown,
            matching,
            publishing,
            stats_loop,
        }
    }

    /// A fresh submission handle.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.handle.stats)
    }

    /// Signal shutdown, wait for every loop to finish, and return the
    /// book for final inspection (depths, resting quantity).
    ///
    /// The publishing loop drains whatever trades are already queued
    /// before exiting; anything it cannot deliver within its retry
    /// budget is dropped.
    pub async fn shutdown(self) -> OrderBook {
        let _ = self.shutdown.send(true);
        drop(self.handle);

        let book = self.matching.await.expect("matching loop panicked");
        self.publishing.await.expect("publishing loop panicked");
        self.stats_loop.await.expect("stats loop panicked");
        book
    }
}

async fn run_matching_loop(
    mut book: OrderBook,
    mut orders: mpsc::UnboundedReceiver<Order>,
    trades: mpsc::UnboundedSender<Trade>,
    stats: Arc<EngineStats>,
    mut shutdown: watch::Receiver<bool>,
) -> OrderBook {
    info!("matching loop started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = orders.recv() => {
                let Some(mut order) = next else { break };

                let result = book.process_order(&mut order, |trade| {
                    stats.record_trade();
                    // The publishing loop outlives this one; a failed send
                    // can only mean teardown is already underway.
                    let _ = trades.send(trade);
                });
                stats.record_order();

                match result {
                    Ok(()) => {}
                    Err(err @ OrderError::PriceOutOfRange { .. }) => {
                        debug!(order_id = order.id, error = %err, "order rejected");
                    }
                    Err(err @ OrderError::PoolExhausted { .. }) => {
                        warn!(order_id = order.id, error = %err, "order could not rest");
                    }
                }
            }
        }
    }

    info!("matching loop stopped");
    book
}

/// Drains the outbound queue until the matching loop drops its sender,
/// so every trade generated before shutdown gets a delivery attempt.
async fn run_publishing_loop<P: TradePublisher>(
    mut trades: mpsc::UnboundedReceiver<Trade>,
    mut publisher: P,
) {
    while let Some(trade) = trades.recv().await {
        publish_with_retry(&mut publisher, trade).await;
    }
    info!("publishing loop stopped");
}

async fn publish_with_retry<P: TradePublisher>(publisher: &mut P, trade: Trade) {
    let mut backoff = PUBLISH_BACKOFF;
    for attempt in 0..=PUBLISH_RETRIES {
        match publisher.publish(trade).await {
            Ok(()) => return,
            Err(err) if attempt < PUBLISH_RETRIES => {
                warn!(attempt, error = %err, "trade publish failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => {
                warn!(
                    maker = trade.maker_order_id,
                    taker = trade.taker_order_id,
                    error = %err,
                    "trade dropped after retries"
                );
            }
        }
    }
}

async fn run_stats_loop(
    stats: Arc<EngineStats>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let snap = stats.snapshot();
                info!(
                    orders = snap.orders_processed,
                    trades = snap.trades_created,
                    "engine stats"
                );
            }
        }
    }
}

/// Pin the current thread to the last available CPU core.
///
/// The last core is the one most commonly isolated from OS interrupts;
/// used by the latency tooling before measurement runs.
pub fn pin_to_last_core() -> bool {
    core_affinity::get_core_ids()
        .and_then(|ids| ids.last().copied())
        .map(core_affinity::set_for_current)
        .unwrap_or(false)
}
