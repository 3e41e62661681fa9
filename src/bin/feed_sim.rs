//! Random order flow simulator.
//!
//! Spawns the full matching pipeline plus a handful of producer tasks
//! that generate orders in a tight band around the mid price, the same
//! workload shape a market-making feed produces. Stats are logged every
//! second; the run ends with a cooperative shutdown and a final summary.

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use peregrine_match::{BookConfig, LogPublisher, MatchingPipeline, Order, PipelineConfig, Side};

#[derive(Parser, Debug)]
#[command(name = "feed-sim", about = "Random order flow generator for the matching pipeline")]
struct Args {
    /// Lowest admissible price
    #[arg(long, default_value_t = 90)]
    min_price: i64,

    /// Highest admissible price
    #[arg(long, default_value_t = 110)]
    max_price: i64,

    /// Resting-order pool capacity
    #[arg(long, default_value_t = 1_000_000)]
    capacity: u32,

    /// Number of producer tasks
    #[arg(long, default_value_t = 2)]
    producers: u64,

    /// Orders per producer
    #[arg(long, default_value_t = 500_000)]
    orders: u64,

    /// Half-width of the band around the mid price orders are drawn from.
    /// Tighter bands cross more often and keep the book small.
    #[arg(long, default_value_t = 2)]
    spread: i64,

    /// PRNG seed
    #[arg(long, default_value_t = 0xF00D)]
    seed: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = PipelineConfig {
        book: BookConfig {
            min_price: args.min_price,
            max_price: args.max_price,
            pool_capacity: args.capacity,
        },
        stats_interval: Duration::from_secs(1),
    };
    let pipeline = MatchingPipeline::spawn(config, LogPublisher);

    let mid = (args.min_price + args.max_price) / 2;
    let lo = (mid - args.spread).max(args.min_price);
    let hi = (mid + args.spread).min(args.max_price);

    tracing::info!(
        producers = args.producers,
        orders_each = args.orders,
        band_lo = lo,
        band_hi = hi,
        "starting producers"
    );

    let mut producers = Vec::new();
    for p in 0..args.producers {
        let handle = pipeline.handle();
        let orders = args.orders;
        let seed = args.seed.wrapping_add(p);
        producers.push(tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            for i in 0..orders {
                let id = (p * orders + i + 1) as i64;
                let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
                let price = rng.gen_range(lo..=hi);
                if handle.enqueue_order(Order::new(id, side, price, 10)).is_err() {
                    break;
                }
                // Let the matching loop interleave with production
                if i % 8192 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    for producer in producers {
        producer.await.expect("producer panicked");
    }

    // Wait for the matching loop to catch up before stopping
    let handle = pipeline.handle();
    let total = args.producers * args.orders;
    while handle.stats().snapshot().orders_processed < total {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let book = pipeline.shutdown().await;

    let snap = handle.stats().snapshot();
    let (bids, asks) = book.depths();
    tracing::info!(
        orders = snap.orders_processed,
        trades = snap.trades_created,
        bid_levels = bids,
        ask_levels = asks,
        resting_qty = book.resting_qty(),
        "run complete"
    );
}
