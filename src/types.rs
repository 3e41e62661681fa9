//! Order and trade contracts shared with the intake and publishing
//! collaborators.
//!
//! Orders flow in through [`crate::pipeline::EngineHandle::enqueue_order`],
//! trades flow out through [`crate::pipeline::TradePublisher`]. Both types
//! are serde-derived so transport adapters can serialize them directly.

use serde::{Deserialize, Serialize};

/// Order side. Wire values follow the submission contract (Buy = 1, Sell = 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 1,
    Sell = 2,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// An incoming limit order.
///
/// `remaining_qty` is the only field matching mutates. Whatever is left
/// after crossing rests in the book as a pool node; the `Order` value
/// itself is discarded once processed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Order {
    /// External order ID (client-assigned)
    pub id: i64,
    pub side: Side,
    /// Scaled integer price (one tick per unit)
    pub price: i64,
    pub original_qty: i64,
    pub remaining_qty: i64,
}

impl Order {
    #[inline]
    pub fn new(id: i64, side: Side, price: i64, qty: i64) -> Self {
        Self {
            id,
            side,
            price,
            original_qty: qty,
            remaining_qty: qty,
        }
    }
}

/// A single match between a resting maker and an incoming taker.
///
/// The maker contributes the price. Immutable once created; delivered to
/// the publishing collaborator in generation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub price: i64,
    pub qty: i64,
    pub maker_order_id: i64,
    pub taker_order_id: i64,
    /// Monotonic nanoseconds since the book was constructed
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_new_order_quantities() {
        let order = Order::new(7, Side::Buy, 100, 25);
        assert_eq!(order.original_qty, 25);
        assert_eq!(order.remaining_qty, 25);
        assert_eq!(order.price, 100);
    }

    #[test]
    fn test_side_wire_values() {
        assert_eq!(Side::Buy as u8, 1);
        assert_eq!(Side::Sell as u8, 2);
    }
}
