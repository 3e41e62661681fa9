//! Wire-row intake mapping for the replay tooling.
//!
//! The engine core never parses transport payloads; this is the
//! collaborator-side conversion from decimal wire rows to scaled-integer
//! orders, kept in-repo so the replay binary can run recorded flow.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{Order, Side};

/// One row of replayable order flow: `id,side,price,quantity`.
#[derive(Debug, Deserialize)]
pub struct OrderRow {
    pub id: i64,
    pub side: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderRow {
    /// Convert to an engine order, scaling the decimal price and quantity
    /// into the integer domain.
    ///
    /// Returns `None` for rows with an unknown side, a non-representable
    /// number, or a non-positive quantity; callers skip those.
    pub fn to_order(&self, price_mult: i64, qty_mult: i64) -> Option<Order> {
        let side = match self.side.as_str() {
            "buy" | "bid" => Side::Buy,
            "sell" | "ask" => Side::Sell,
            _ => return None,
        };

        let price = (self.price * Decimal::from(price_mult)).to_i64()?;
        let qty = (self.quantity * Decimal::from(qty_mult)).to_i64()?;
        if qty <= 0 {
            return None;
        }

        Some(Order::new(self.id, side, price, qty))
    }
}
