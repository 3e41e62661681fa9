//! Order book - dense price-level storage plus the matching algorithm.
//!
//! Price levels are stored one slot per discrete price across the
//! configured domain, indexed by `price - min_price`. Matching walks the
//! opposite side best-price-first and fills FIFO within a level, giving
//! price-time priority. The book is single-owner: `process_order` and
//! `clear` carry no internal synchronization.

use std::time::Instant;

use crate::error::OrderError;
use crate::pool::{OrderPool, NULL_INDEX};
use crate::price_level::PriceLevel;
use crate::types::{Order, Side, Trade};

/// Book domain and capacity.
///
/// Defaults match the simulated FX band the engine runs against in the
/// feed simulator: a 21-tick price band and room for one million resting
/// orders.
#[derive(Clone, Copy, Debug)]
pub struct BookConfig {
    /// Lowest admissible price
    pub min_price: i64,
    /// Highest admissible price (inclusive)
    pub max_price: i64,
    /// Resting-order pool capacity
    pub pool_capacity: u32,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            min_price: 90,
            max_price: 110,
            pool_capacity: 1_000_000,
        }
    }
}

impl BookConfig {
    /// Number of discrete price levels per side.
    pub fn domain_size(&self) -> usize {
        (self.max_price - self.min_price + 1) as usize
    }
}

/// The limit order book for a single instrument.
pub struct OrderBook {
    /// Bid levels, indexed by `price - min_price`
    bids: Box<[PriceLevel]>,
    /// Ask levels, indexed by `price - min_price`
    asks: Box<[PriceLevel]>,
    /// Count of non-empty bid levels
    bid_depth: u32,
    /// Count of non-empty ask levels
    ask_depth: u32,
    pool: OrderPool,
    min_price: i64,
    max_price: i64,
    /// Origin for trade timestamps (monotonic)
    epoch: Instant,
}

impl OrderBook {
    /// Create an empty book over the configured price domain.
    ///
    /// # Panics
    /// Panics if the domain is empty (`max_price < min_price`).
    pub fn new(config: BookConfig) -> Self {
        assert!(
            config.max_price >= config.min_price,
            "book domain must be non-empty"
        );
        let domain = config.domain_size();
        Self {
            bids: vec![PriceLevel::new(); domain].into_boxed_slice(),
            asks: vec![PriceLevel::new(); domain].into_boxed_slice(),
            bid_depth: 0,
            ask_depth: 0,
            pool: OrderPool::new(config.pool_capacity),
            min_price: config.min_price,
            max_price: config.max_price,
            epoch: Instant::now(),
        }
    }

    /// Match an incoming order against the book, then rest any remainder.
    ///
    /// Trades are handed to `on_trade` one at a time, in the order they
    /// are generated. The sink must not assume anything beyond that; it
    /// typically forwards into the outbound queue.
    ///
    /// # Errors
    /// - [`OrderError::PriceOutOfRange`]: the order never touched the
    ///   book; no trade was emitted.
    /// - [`OrderError::PoolExhausted`]: the order matched as far as it
    ///   could (those trades stand) but its remainder could not rest.
    pub fn process_order(
        &mut self,
        order: &mut Order,
        mut on_trade: impl FnMut(Trade),
    ) -> Result<(), OrderError> {
        let price_index = self
            .price_index(order.price)
            .ok_or(OrderError::PriceOutOfRange {
                price: order.price,
                min: self.min_price,
                max: self.max_price,
            })?;

        while order.remaining_qty > 0 && self.opposite_depth(order.side) > 0 {
            let Some(best_index) = self.best_opposite_index(order.side) else {
                break;
            };
            let best_price = self.min_price + best_index as i64;

            // Crossing condition: a buyer pays up to its limit, a seller
            // accepts down to its limit.
            let crosses = match order.side {
                Side::Buy => best_price <= order.price,
                Side::Sell => best_price >= order.price,
            };
            if !crosses {
                break;
            }

            // Maker is the oldest order at the best opposite level
            let maker_side = order.side.opposite();
            let maker_index = self.levels(maker_side)[best_index].front();
            debug_assert!(maker_index != NULL_INDEX);

            let maker = self.pool.get_mut(maker_index);
            let qty = order.remaining_qty.min(maker.qty);
            let maker_id = maker.id;
            maker.qty -= qty;
            let maker_filled = maker.qty == 0;
            order.remaining_qty -= qty;

            on_trade(Trade {
                price: best_price,
                qty,
                maker_order_id: maker_id,
                taker_order_id: order.id,
                timestamp: self.now(),
            });

            if maker_filled {
                self.unlink_head(maker_side, best_index);
            }
        }

        if order.remaining_qty > 0 {
            self.rest(order, price_index)?;
        }

        Ok(())
    }

    /// Reset the book to empty: pool, both sides, both depth counters.
    ///
    /// Used between sessions and in tests; must not run concurrently
    /// with `process_order`.
    pub fn clear(&mut self) {
        self.pool.reset();
        self.bids.fill(PriceLevel::new());
        self.asks.fill(PriceLevel::new());
        self.bid_depth = 0;
        self.ask_depth = 0;
    }

    /// Count of distinct non-empty price levels per side, `(bids, asks)`.
    ///
    /// This is level depth, not order count or aggregate quantity.
    #[inline]
    pub fn depths(&self) -> (u32, u32) {
        (self.bid_depth, self.ask_depth)
    }

    /// Number of orders currently resting in the book.
    #[inline]
    pub fn resting_orders(&self) -> u32 {
        self.pool.rented()
    }

    /// Total quantity resting across both sides.
    ///
    /// Walks every chain - O(resting orders). Reporting use only, never
    /// on the matching path.
    pub fn resting_qty(&self) -> i64 {
        let mut total = 0;
        for level in self.bids.iter().chain(self.asks.iter()) {
            let mut idx = level.head;
            while idx != NULL_INDEX {
                let node = self.pool.get(idx);
                total += node.qty;
                idx = node.next;
            }
        }
        total
    }

    /// Lowest admissible price.
    #[inline]
    pub fn min_price(&self) -> i64 {
        self.min_price
    }

    /// Highest admissible price.
    #[inline]
    pub fn max_price(&self) -> i64 {
        self.max_price
    }

    /// Pre-fault the pool's pages before latency-sensitive runs.
    pub fn warm_up(&mut self) {
        self.pool.warm_up();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    #[inline]
    fn price_index(&self, price: i64) -> Option<usize> {
        if price < self.min_price || price > self.max_price {
            return None;
        }
        Some((price - self.min_price) as usize)
    }

    #[inline]
    fn now(&self) -> i64 {
        self.epoch.elapsed().as_nanos() as i64
    }

    #[inline]
    fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    fn opposite_depth(&self, taker_side: Side) -> u32 {
        match taker_side {
            Side::Buy => self.ask_depth,
            Side::Sell => self.bid_depth,
        }
    }

    /// Linear scan for the best opposite level: lowest non-empty ask for
    /// a buyer, highest non-empty bid for a seller. O(domain size) - fine
    /// for the narrow bands this book is configured with.
    #[inline]
    fn best_opposite_index(&self, taker_side: Side) -> Option<usize> {
        match taker_side {
            Side::Buy => self.asks.iter().position(|level| !level.is_empty()),
            Side::Sell => self.bids.iter().rposition(|level| !level.is_empty()),
        }
    }

    /// Remove the filled head order at `level_index` on the maker side
    /// and return its slot to the pool.
    fn unlink_head(&mut self, maker_side: Side, level_index: usize) {
        let (levels, depth) = match maker_side {
            Side::Buy => (&mut self.bids, &mut self.bid_depth),
            Side::Sell => (&mut self.asks, &mut self.ask_depth),
        };
        let level = &mut levels[level_index];
        let index = level
            .pop_front(&mut self.pool)
            .expect("matched level cannot be empty");
        self.pool.free(index);
        if level.is_empty() {
            *depth -= 1;
        }
    }

    /// Rest the order's remainder at the tail of its own side's level.
    fn rest(&mut self, order: &Order, price_index: usize) -> Result<(), OrderError> {
        let index = self.pool.alloc().ok_or(OrderError::PoolExhausted {
            capacity: self.pool.capacity(),
        })?;

        let node = self.pool.get_mut(index);
        node.id = order.id;
        node.price = order.price;
        node.qty = order.remaining_qty;
        node.side = order.side;

        let (levels, depth) = match order.side {
            Side::Buy => (&mut self.bids, &mut self.bid_depth),
            Side::Sell => (&mut self.asks, &mut self.ask_depth),
        };
        let level = &mut levels[price_index];
        let was_empty = level.is_empty();
        level.push_back(&mut self.pool, index);
        if was_empty {
            *depth += 1;
        }

        Ok(())
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("min_price", &self.min_price)
            .field("max_price", &self.max_price)
            .field("bid_depth", &self.bid_depth)
            .field("ask_depth", &self.ask_depth)
            .field("resting_orders", &self.pool.rented())
            .finish()
    }
}
