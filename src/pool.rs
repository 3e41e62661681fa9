//! Order pool - a fixed-capacity slab for resting-order nodes.
//!
//! The pool pre-allocates every node at construction and recycles slots
//! through a free list threaded through the `next` field of unused nodes.
//! Renting and returning are O(1) and allocation-free; the matching hot
//! path never touches the heap.

use std::fmt;

use crate::types::Side;

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Index into the pool's slab - a compressed pointer.
/// Using u32 instead of 64-bit pointers halves linkage metadata.
pub type PoolIndex = u32;

/// A resting order inside the pool - exactly 64 bytes (one cache line).
///
/// The `next`/`prev` indices double as the FIFO chain linkage within a
/// price level and as the free-list linkage while the slot is unused.
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct OrderNode {
    /// Scaled integer price the order rests at
    pub price: i64,

    /// Remaining quantity
    pub qty: i64,

    /// External order ID
    pub id: i64,

    /// Index of the next (younger) order at the same price level
    pub next: PoolIndex,

    /// Index of the previous (older) order at the same price level
    pub prev: PoolIndex,

    pub side: Side,

    /// Whether the slot is currently rented. Guards against double return.
    live: bool,
}

// Compile-time assertion: OrderNode must stay within one cache line
const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 64,
    "OrderNode must be exactly 64 bytes (one cache line)"
);

impl OrderNode {
    /// Create an empty/unrented node (for free-list slots)
    #[inline]
    const fn empty() -> Self {
        Self {
            price: 0,
            qty: 0,
            id: 0,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            side: Side::Buy,
            live: false,
        }
    }

    /// Reset the node for reuse when it goes back on the free list
    #[inline]
    fn reset(&mut self) {
        self.price = 0;
        self.qty = 0;
        self.id = 0;
        self.next = NULL_INDEX;
        self.prev = NULL_INDEX;
        self.side = Side::Buy;
        self.live = false;
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("id", &self.id)
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("side", &self.side)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Pre-allocated node storage with O(1) rent and return.
///
/// The free list and the live price-level chains partition the index
/// range at all times; a slot is on exactly one of them.
pub struct OrderPool {
    /// Contiguous block of pre-allocated nodes
    nodes: Vec<OrderNode>,

    /// Head of the free list (index of the first available slot)
    free_head: PoolIndex,

    /// Number of currently rented slots
    rented: u32,

    /// Total capacity
    capacity: u32,
}

impl OrderPool {
    /// Create a pool holding up to `capacity` resting orders.
    ///
    /// # Panics
    /// Panics if capacity is zero or would collide with the null sentinel.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        assert!(
            capacity < NULL_INDEX,
            "pool capacity must be less than NULL_INDEX"
        );

        let mut nodes = vec![OrderNode::empty(); capacity as usize];

        // Thread the free list through all slots: 0 -> 1 -> ... -> null
        for i in 0..capacity - 1 {
            nodes[i as usize].next = i + 1;
        }
        nodes[(capacity - 1) as usize].next = NULL_INDEX;

        Self {
            nodes,
            free_head: 0,
            rented: 0,
            capacity,
        }
    }

    /// Rent a slot from the pool.
    ///
    /// Returns `None` when the pool is exhausted - callers report this
    /// as an admission failure, they never panic on it.
    ///
    /// # Complexity
    /// O(1) - pops the free-list head
    #[inline]
    pub fn alloc(&mut self) -> Option<PoolIndex> {
        if self.free_head == NULL_INDEX {
            return None;
        }

        let index = self.free_head;
        let node = &mut self.nodes[index as usize];
        self.free_head = node.next;
        node.next = NULL_INDEX;
        node.prev = NULL_INDEX;
        node.live = true;
        self.rented += 1;

        Some(index)
    }

    /// Return a slot to the pool.
    ///
    /// Returning a slot that is not currently rented would corrupt the
    /// free list, so it aborts instead of continuing with damaged
    /// financial state.
    ///
    /// # Complexity
    /// O(1) - pushes onto the free-list head
    #[inline]
    pub fn free(&mut self, index: PoolIndex) {
        assert!(index < self.capacity, "pool index {index} out of bounds");
        let node = &mut self.nodes[index as usize];
        assert!(node.live, "double return of pool slot {index}");

        node.reset();
        node.next = self.free_head;
        self.free_head = index;
        self.rented -= 1;
    }

    /// Rebuild the free list from scratch.
    ///
    /// O(capacity); used only by full-book clears, never on the matching
    /// hot path.
    pub fn reset(&mut self) {
        let last = (self.capacity - 1) as usize;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.reset();
            node.next = if i == last { NULL_INDEX } else { i as u32 + 1 };
        }
        self.free_head = 0;
        self.rented = 0;
    }

    /// Get an immutable reference to a rented node.
    #[inline]
    pub fn get(&self, index: PoolIndex) -> &OrderNode {
        debug_assert!(index < self.capacity, "pool index out of bounds");
        let node = &self.nodes[index as usize];
        debug_assert!(node.live, "access to unrented pool slot");
        node
    }

    /// Get a mutable reference to a rented node.
    #[inline]
    pub fn get_mut(&mut self, index: PoolIndex) -> &mut OrderNode {
        debug_assert!(index < self.capacity, "pool index out of bounds");
        let node = &mut self.nodes[index as usize];
        debug_assert!(node.live, "access to unrented pool slot");
        node
    }

    /// Number of currently rented slots.
    #[inline]
    pub fn rented(&self) -> u32 {
        self.rented
    }

    /// Total capacity of the pool.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns true when no free slot remains.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.free_head == NULL_INDEX
    }

    /// Pre-fault the slab pages so the matching path never page-faults.
    ///
    /// Walks every node with a volatile self-write to force the OS to map
    /// virtual pages to physical RAM.
    pub fn warm_up(&mut self) {
        for node in &mut self.nodes {
            let prev = node.prev;
            unsafe {
                std::ptr::write_volatile(&mut node.prev, prev);
            }
        }
    }
}

impl fmt::Debug for OrderPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderPool")
            .field("capacity", &self.capacity)
            .field("rented", &self.rented)
            .field("free_head", &self.free_head)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_size() {
        assert_eq!(std::mem::size_of::<OrderNode>(), 64);
        assert_eq!(std::mem::align_of::<OrderNode>(), 64);
    }

    #[test]
    fn test_pool_creation() {
        let pool = OrderPool::new(100);
        assert_eq!(pool.capacity(), 100);
        assert_eq!(pool.rented(), 0);
        assert!(!pool.is_exhausted());
    }

    #[test]
    fn test_alloc_free_reuse() {
        let mut pool = OrderPool::new(3);

        let a = pool.alloc().expect("slot");
        let b = pool.alloc().expect("slot");
        let c = pool.alloc().expect("slot");

        assert_eq!(pool.rented(), 3);
        assert!(pool.is_exhausted());
        assert!(pool.alloc().is_none(), "exhausted pool must refuse");

        pool.free(b);
        assert_eq!(pool.rented(), 2);

        // Freed slot is the next one handed out
        let d = pool.alloc().expect("slot");
        assert_eq!(d, b);

        pool.free(a);
        pool.free(c);
        pool.free(d);
        assert_eq!(pool.rented(), 0);
    }

    #[test]
    fn test_populate_and_read_back() {
        let mut pool = OrderPool::new(10);
        let idx = pool.alloc().unwrap();

        let node = pool.get_mut(idx);
        node.id = 12345;
        node.price = 105;
        node.qty = 40;
        node.side = Side::Sell;

        let node = pool.get(idx);
        assert_eq!(node.id, 12345);
        assert_eq!(node.price, 105);
        assert_eq!(node.qty, 40);
        assert_eq!(node.side, Side::Sell);
        assert_eq!(node.next, NULL_INDEX);
        assert_eq!(node.prev, NULL_INDEX);
    }

    #[test]
    #[should_panic(expected = "double return")]
    fn test_double_return_detected() {
        let mut pool = OrderPool::new(4);
        let idx = pool.alloc().unwrap();
        pool.free(idx);
        pool.free(idx);
    }

    #[test]
    fn test_reset_rebuilds_free_list() {
        let mut pool = OrderPool::new(5);
        for _ in 0..5 {
            pool.alloc().unwrap();
        }
        assert!(pool.is_exhausted());

        pool.reset();
        assert_eq!(pool.rented(), 0);

        // Full capacity available again, in slab order
        for expected in 0..5 {
            assert_eq!(pool.alloc(), Some(expected));
        }
    }

    #[test]
    fn test_warm_up() {
        let mut pool = OrderPool::new(1000);
        pool.warm_up(); // Should not panic or disturb state
        assert_eq!(pool.rented(), 0);
        assert_eq!(pool.alloc(), Some(0));
    }
}
