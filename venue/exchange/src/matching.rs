//! Crossing predicates and fill settlement math
//!
//! Pure helpers shared by the matcher: whether an incoming order crosses a
//! resting one, the price a fill executes at, and the integer split of a
//! fill's gross value into seller proceeds and the fee cut.

use types::numeric::{fee_cut, quote_cost, Price, Quantity};
use types::order::Side;

/// Check if an incoming order crosses a resting counter-order
///
/// A buy crosses a resting ask priced at or below it; a sell crosses a
/// resting bid priced at or above it.
pub fn crosses(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::BUY => resting_price <= incoming_price,
        Side::SELL => resting_price >= incoming_price,
    }
}

/// Price a fill executes at: always the sell order's price
///
/// For an incoming buy that is the resting ask's price; for an incoming
/// sell it is the incoming order's own price. Under the crossing predicate
/// this keeps `buy.price >= exec >= sell.price` for every fill.
pub fn execution_price(incoming_side: Side, incoming_price: Price, resting_price: Price) -> Price {
    match incoming_side {
        Side::BUY => resting_price,
        Side::SELL => incoming_price,
    }
}

/// Integer split of one fill's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSettlement {
    /// `floor(qty * exec_price / 10^6)` USDT
    pub gross: u64,
    /// `floor(gross * fee_bps / 10_000)` USDT to the fee collector
    pub fee: u64,
    /// `gross - fee` USDT to the seller
    pub seller_net: u64,
}

/// Settle a fill of `match_qty` at `exec_price` under the given fee
pub fn settle(match_qty: Quantity, exec_price: Price, fee_bps: u16) -> FillSettlement {
    let gross = quote_cost(match_qty, exec_price);
    let fee = fee_cut(gross, fee_bps);
    FillSettlement {
        gross,
        fee,
        seller_net: gross - fee,
    }
}
