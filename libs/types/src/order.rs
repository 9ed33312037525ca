//! Order lifecycle types
//!
//! An order is created OPEN, transitions to FILLED when its fill counter
//! reaches its quantity, or to CANCELLED by the maker, by anyone after
//! [`MAX_ORDER_AGE`](crate::numeric::MAX_ORDER_AGE), or by the matcher when
//! it encounters a stale counter-order. FILLED and CANCELLED are terminal.

use crate::ids::{AccountId, AssetId, OrderId};
use crate::numeric::{quote_cost, Price, Quantity, MAX_ORDER_AGE};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Resting or partially filled, still on the book
    #[serde(rename = "OPEN")]
    Open,
    /// Completely matched (terminal)
    #[serde(rename = "FILLED")]
    Filled,
    /// Cancelled by maker, expiry, or the matcher (terminal)
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A resting or historical order record
///
/// Invariants: quantity > 0, price > 0, filled ≤ quantity,
/// status = FILLED ⇔ filled = quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub maker: AccountId,
    pub security_token: AssetId,
    pub quantity: Quantity,
    pub price: Price,
    pub side: Side,
    pub status: OrderStatus,
    /// Logical timestamp supplied by the host at submission, in seconds
    pub created_at: i64,
    pub filled: Quantity,
}

impl Order {
    /// Create a new open order
    pub fn new(
        id: OrderId,
        maker: AccountId,
        security_token: AssetId,
        quantity: Quantity,
        price: Price,
        side: Side,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            maker,
            security_token,
            quantity,
            price,
            side,
            status: OrderStatus::Open,
            created_at,
            filled: Quantity::zero(),
        }
    }

    /// Unfilled quantity
    pub fn remaining(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled)
    }

    /// Check if the order is open
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Check if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled == self.quantity
    }

    /// Check if the order has outlived the maximum order age at `now`
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.created_at + MAX_ORDER_AGE
    }

    /// USDT currently escrowed for this order if it is an open BUY:
    /// `floor(remaining * price / 10^6)`
    pub fn escrowed_quote(&self) -> u64 {
        quote_cost(self.remaining(), self.price)
    }

    /// Record a fill and transition to FILLED on exhaustion
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity or the order is
    /// not open.
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        assert!(self.is_open(), "Cannot fill a non-open order");
        assert!(
            fill_quantity.as_u64() <= self.remaining().as_u64(),
            "Fill would exceed order quantity"
        );

        self.filled = Quantity::try_new(self.filled.as_u64() + fill_quantity.as_u64())
            .unwrap_or_else(Quantity::zero);

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        }
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if the order is already in a terminal state.
    pub fn cancel(&mut self) {
        assert!(self.is_open(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
    }
}
