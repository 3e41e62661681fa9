//! Per-order matching latency report.
//!
//! Feeds alternating buy/sell orders through a warmed-up book and records
//! each `process_order` call into an HDR histogram.

use clap::Parser;
use hdrhistogram::Histogram;
use std::time::Instant;

use peregrine_match::{pin_to_last_core, BookConfig, Order, OrderBook, Side};

#[derive(Parser, Debug)]
#[command(name = "latency-report", about = "Matching-path latency percentiles")]
struct Args {
    /// Number of orders to push through the book
    #[arg(long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Pin the measurement thread to the last CPU core
    #[arg(long, default_value_t = false)]
    pin: bool,
}

fn main() {
    let args = Args::parse();

    if args.pin && !pin_to_last_core() {
        eprintln!("warning: could not pin to a core, continuing unpinned");
    }

    println!("Preparing latency run...");

    let mut book = OrderBook::new(BookConfig::default());
    book.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3).unwrap();

    println!("Running {} iterations...", args.iterations);

    let mut trades = 0u64;
    let mut total_duration = std::time::Duration::new(0, 0);

    for i in 1..=args.iterations {
        // Tight band around the mid price so the book both rests and matches
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let price = 98 + (i % 5) as i64;
        let mut order = Order::new(i as i64, side, price, 10);

        let start = Instant::now();

        std::hint::black_box(book.process_order(&mut order, |_| trades += 1)).ok();

        let elapsed = start.elapsed();
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", args.iterations);
    println!("Trades:     {}", trades);
    println!(
        "Throughput: {:.2} ops/sec",
        args.iterations as f64 / total_duration.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    let (bids, asks) = book.depths();
    println!("\nFinal book: {} bid levels, {} ask levels", bids, asks);
}
