//! Replays recorded CSV order flow through the book.
//!
//! Rows are `id,side,price,quantity` with decimal prices/quantities,
//! scaled into the integer domain before processing. Prints a summary of
//! trades, rejections, and final book state.

use clap::Parser;
use std::path::PathBuf;

use peregrine_match::feed::OrderRow;
use peregrine_match::{BookConfig, OrderBook, OrderError};

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Replay CSV order flow through the matching engine")]
struct Args {
    /// CSV file with header `id,side,price,quantity`
    file: PathBuf,

    /// Multiplier scaling decimal prices into ticks
    #[arg(long, default_value_t = 1)]
    price_mult: i64,

    /// Multiplier scaling decimal quantities into units
    #[arg(long, default_value_t = 1)]
    qty_mult: i64,

    /// Lowest admissible price (in ticks)
    #[arg(long, default_value_t = 90)]
    min_price: i64,

    /// Highest admissible price (in ticks)
    #[arg(long, default_value_t = 110)]
    max_price: i64,

    /// Resting-order pool capacity
    #[arg(long, default_value_t = 1_000_000)]
    capacity: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut book = OrderBook::new(BookConfig {
        min_price: args.min_price,
        max_price: args.max_price,
        pool_capacity: args.capacity,
    });

    let mut reader = csv::Reader::from_path(&args.file)?;

    let mut orders = 0u64;
    let mut trades = 0u64;
    let mut volume = 0i64;
    let mut rejected = 0u64;
    let mut unrested = 0u64;
    let mut skipped = 0u64;

    for row in reader.deserialize::<OrderRow>() {
        let row = row?;
        let Some(mut order) = row.to_order(args.price_mult, args.qty_mult) else {
            skipped += 1;
            continue;
        };

        orders += 1;
        let result = book.process_order(&mut order, |trade| {
            trades += 1;
            volume += trade.qty;
        });
        match result {
            Ok(()) => {}
            Err(OrderError::PriceOutOfRange { .. }) => rejected += 1,
            Err(err @ OrderError::PoolExhausted { .. }) => {
                tracing::warn!(order_id = order.id, error = %err, "remainder dropped");
                unrested += 1;
            }
        }
    }

    let (bids, asks) = book.depths();
    println!("=== Replay Summary ===");
    println!("Orders:        {orders}");
    println!("Trades:        {trades}");
    println!("Volume:        {volume}");
    println!("Rejected:      {rejected}");
    println!("Unrested:      {unrested}");
    println!("Skipped rows:  {skipped}");
    println!("Final book:    {bids} bid levels, {asks} ask levels");
    println!("Resting qty:   {}", book.resting_qty());

    Ok(())
}
