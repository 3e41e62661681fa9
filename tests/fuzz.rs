//! Differential fuzz - compares the engine against a naive but obviously
//! correct reference book over seeded random workloads.

use std::collections::{BTreeMap, VecDeque};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use peregrine_match::{BookConfig, Order, OrderBook, OrderError, Side};

/// Simple reference implementation for verification: sorted maps of FIFO
/// queues, matched the slow way.
struct ReferenceBook {
    bids: BTreeMap<i64, VecDeque<(i64, i64)>>, // price -> [(order_id, qty)]
    asks: BTreeMap<i64, VecDeque<(i64, i64)>>,
}

impl ReferenceBook {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Returns the fills as `(price, qty, maker_id)` in match order.
    fn place(&mut self, order: &Order) -> Vec<(i64, i64, i64)> {
        let mut remaining = order.remaining_qty;
        let mut fills = Vec::new();

        loop {
            if remaining == 0 {
                break;
            }
            // Best opposite price, if it crosses
            let price = match order.side {
                Side::Buy => match self.asks.keys().next() {
                    Some(&p) if p <= order.price => p,
                    _ => break,
                },
                Side::Sell => match self.bids.keys().next_back() {
                    Some(&p) if p >= order.price => p,
                    _ => break,
                },
            };
            let opposite = match order.side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };

            let queue = opposite.get_mut(&price).unwrap();
            while remaining > 0 {
                let Some(front) = queue.front_mut() else { break };
                let take = remaining.min(front.1);
                fills.push((price, take, front.0));
                front.1 -= take;
                remaining -= take;
                if front.1 == 0 {
                    queue.pop_front();
                }
            }
            if queue.is_empty() {
                opposite.remove(&price);
            }
        }

        if remaining > 0 {
            let own = match order.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            own.entry(order.price)
                .or_default()
                .push_back((order.id, remaining));
        }

        fills
    }

    fn depths(&self) -> (u32, u32) {
        (self.bids.len() as u32, self.asks.len() as u32)
    }

    fn resting_qty(&self) -> i64 {
        self.bids
            .values()
            .chain(self.asks.values())
            .flatten()
            .map(|(_, qty)| qty)
            .sum()
    }
}

fn random_order(rng: &mut ChaCha8Rng, id: i64) -> Order {
    Order::new(
        id,
        if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
        rng.gen_range(85..=115), // occasionally outside the 90..=110 domain
        rng.gen_range(1..200),
    )
}

#[test]
fn test_fuzz_matches_reference() {
    const SEED: u64 = 0xFEEDFACE;
    const OPS: usize = 10_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new(BookConfig::default());
    let mut reference = ReferenceBook::new();

    for i in 0..OPS {
        let mut order = random_order(&mut rng, i as i64);
        let submitted = order;

        let mut fills = Vec::new();
        match book.process_order(&mut order, |t| {
            fills.push((t.price, t.qty, t.maker_order_id));
        }) {
            Ok(()) => {
                let expected = reference.place(&submitted);
                assert_eq!(fills, expected, "fill mismatch at op {i}");
            }
            Err(OrderError::PriceOutOfRange { .. }) => {
                assert!(
                    !(90..=110).contains(&submitted.price),
                    "in-domain order rejected at op {i}"
                );
                assert!(fills.is_empty());
            }
            Err(err) => panic!("unexpected error at op {i}: {err}"),
        }

        assert_eq!(book.depths(), reference.depths(), "depth mismatch at op {i}");
    }

    assert_eq!(book.resting_qty(), reference.resting_qty());
    println!("Differential fuzz passed over {OPS} orders");
}

#[test]
fn test_fuzz_deterministic_replay() {
    const SEED: u64 = 0xBADC0DE;
    const OPS: usize = 5_000;

    let run = || {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let mut book = OrderBook::new(BookConfig::default());
        let mut fills = Vec::new();

        for i in 0..OPS {
            let mut order = random_order(&mut rng, i as i64);
            let _ = book.process_order(&mut order, |t| {
                fills.push((t.price, t.qty, t.maker_order_id, t.taker_order_id));
            });
        }
        (fills, book.depths(), book.resting_qty())
    };

    let (fills_a, depths_a, resting_a) = run();
    let (fills_b, depths_b, resting_b) = run();

    assert_eq!(fills_a, fills_b);
    assert_eq!(depths_a, depths_b);
    assert_eq!(resting_a, resting_b);
}

#[test]
fn test_fuzz_clear_restores_clean_state() {
    const SEED: u64 = 0x12345678;
    const OPS: usize = 2_000;

    let mut book = OrderBook::new(BookConfig::default());

    let mut drive = |book: &mut OrderBook| {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let mut fills = Vec::new();
        for i in 0..OPS {
            let mut order = random_order(&mut rng, i as i64);
            let _ = book.process_order(&mut order, |t| fills.push((t.price, t.qty)));
        }
        (fills, book.depths())
    };

    let first = drive(&mut book);
    book.clear();
    let second = drive(&mut book);

    // A cleared book must behave exactly like a fresh one
    assert_eq!(first, second);
}
