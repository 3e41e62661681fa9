//! Price level - a FIFO queue of resting orders at a single discrete price.
//!
//! Implemented as a doubly-linked chain of pool indices. Head is the
//! oldest order (first to match - the time component of price-time
//! priority), tail is the youngest.

use crate::pool::{OrderPool, PoolIndex, NULL_INDEX};

/// Head and tail of the chain at one price.
///
/// Both indices are null iff the level is empty; otherwise they bound a
/// valid doubly-linked FIFO chain of pool nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PriceLevel {
    /// Index of the oldest order (highest priority)
    pub head: PoolIndex,
    /// Index of the newest order (last to match)
    pub tail: PoolIndex,
}

impl PriceLevel {
    /// Create a new empty price level
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: NULL_INDEX,
            tail: NULL_INDEX,
        }
    }

    /// Returns true if there are no orders at this level
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.head == NULL_INDEX
    }

    /// Index of the oldest order, or `NULL_INDEX` if empty.
    #[inline]
    pub const fn front(&self) -> PoolIndex {
        self.head
    }

    /// Append a freshly rented node as the youngest order.
    ///
    /// The node's linkage must be clear (as `alloc` leaves it).
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn push_back(&mut self, pool: &mut OrderPool, index: PoolIndex) {
        debug_assert!(pool.get(index).next == NULL_INDEX);
        debug_assert!(pool.get(index).prev == NULL_INDEX);

        if self.tail == NULL_INDEX {
            debug_assert!(self.head == NULL_INDEX);
            self.head = index;
            self.tail = index;
        } else {
            pool.get_mut(self.tail).next = index;
            pool.get_mut(index).prev = self.tail;
            self.tail = index;
        }
    }

    /// Unlink and return the oldest order.
    ///
    /// The slot is NOT returned to the pool; the caller does that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn pop_front(&mut self, pool: &mut OrderPool) -> Option<PoolIndex> {
        if self.head == NULL_INDEX {
            return None;
        }

        let index = self.head;
        let next = pool.get(index).next;

        if next == NULL_INDEX {
            // Was the only node
            self.head = NULL_INDEX;
            self.tail = NULL_INDEX;
        } else {
            pool.get_mut(next).prev = NULL_INDEX;
            self.head = next;
        }

        let node = pool.get_mut(index);
        node.next = NULL_INDEX;
        node.prev = NULL_INDEX;

        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rent_orders(pool: &mut OrderPool, count: u32) -> Vec<PoolIndex> {
        (0..count)
            .map(|i| {
                let idx = pool.alloc().unwrap();
                let node = pool.get_mut(idx);
                node.id = i as i64;
                node.qty = 10;
                node.price = 100;
                idx
            })
            .collect()
    }

    #[test]
    fn test_empty_level() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.head, NULL_INDEX);
        assert_eq!(level.tail, NULL_INDEX);
        assert_eq!(level.front(), NULL_INDEX);
    }

    #[test]
    fn test_push_single() {
        let mut pool = OrderPool::new(10);
        let mut level = PriceLevel::new();

        let idx = pool.alloc().unwrap();
        level.push_back(&mut pool, idx);

        assert!(!level.is_empty());
        assert_eq!(level.head, idx);
        assert_eq!(level.tail, idx);
    }

    #[test]
    fn test_fifo_linkage() {
        let mut pool = OrderPool::new(10);
        let mut level = PriceLevel::new();
        let indices = rent_orders(&mut pool, 3);

        for &idx in &indices {
            level.push_back(&mut pool, idx);
        }

        assert_eq!(level.head, indices[0]);
        assert_eq!(level.tail, indices[2]);

        assert_eq!(pool.get(indices[0]).next, indices[1]);
        assert_eq!(pool.get(indices[1]).prev, indices[0]);
        assert_eq!(pool.get(indices[1]).next, indices[2]);
        assert_eq!(pool.get(indices[2]).prev, indices[1]);
    }

    #[test]
    fn test_pop_front_in_arrival_order() {
        let mut pool = OrderPool::new(10);
        let mut level = PriceLevel::new();
        let indices = rent_orders(&mut pool, 3);

        for &idx in &indices {
            level.push_back(&mut pool, idx);
        }

        assert_eq!(level.pop_front(&mut pool), Some(indices[0]));
        assert_eq!(level.head, indices[1]);
        assert_eq!(pool.get(indices[1]).prev, NULL_INDEX);

        assert_eq!(level.pop_front(&mut pool), Some(indices[1]));
        assert_eq!(level.pop_front(&mut pool), Some(indices[2]));

        assert!(level.is_empty());
        assert_eq!(level.tail, NULL_INDEX);
        assert_eq!(level.pop_front(&mut pool), None);
    }
}
