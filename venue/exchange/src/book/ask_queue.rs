//! Ask (sell-side) order queue
//!
//! Price levels sorted so the lowest ask ranks first; FIFO within a level.

use std::collections::{BTreeMap, VecDeque};
use types::ids::OrderId;
use types::numeric::Price;

/// Ask (sell) side of a token's book
///
/// Best ask is the lowest price level; within a level, the earliest
/// inserted order ranks first.
#[derive(Debug, Clone, Default)]
pub struct AskQueue {
    levels: BTreeMap<Price, VecDeque<OrderId>>,
}

impl AskQueue {
    /// Create a new empty ask queue
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert an order id at the back of its price level
    pub fn insert(&mut self, price: Price, order_id: OrderId) {
        self.levels.entry(price).or_default().push_back(order_id);
    }

    /// Remove an order id from its price level
    ///
    /// Returns true if the order was found and removed.
    pub fn remove(&mut self, price: Price, order_id: OrderId) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if let Some(position) = level.iter().position(|id| *id == order_id) {
                level.remove(position);
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// All order ids in matching priority: price ascending, FIFO per level
    pub fn ids_in_priority(&self) -> Vec<OrderId> {
        self.levels
            .iter()
            .flat_map(|(_, level)| level.iter().copied())
            .collect()
    }

    /// Check if the ask queue is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
