//! Exchange events
//!
//! Events are immutable records appended by order book and incentive
//! operations. Field sets are wire-frozen for host compatibility. A failed
//! call never logs.

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, AssetId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::Side;

/// A new order was accepted onto the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub maker: AccountId,
    pub security_token: AssetId,
    pub amount: Quantity,
    pub price: Price,
    pub side: Side,
}

/// One matched pair; emitted once per fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub resting_order_id: OrderId,
    pub resting_maker: AccountId,
    pub taker: AccountId,
    pub amount: Quantity,
    pub exec_price: Price,
}

/// An order left the book without (fully) filling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
}

/// Fee cut routed to the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesCollected {
    pub asset: AssetId,
    pub collector: AccountId,
    pub amount: u64,
}

/// A liquidity provider registered with the incentive module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProviderRegistered {
    pub provider: AccountId,
}

/// A liquidity provider was deactivated by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProviderDeactivated {
    pub provider: AccountId,
}

/// An incentive program was created for a security token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveProgramCreated {
    pub token: AssetId,
    pub daily_rate_bps: u64,
    pub end_time: i64,
}

/// An incentive program was toggled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveProgramUpdated {
    pub token: AssetId,
    pub active: bool,
}

/// Collateral locked into a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLocked {
    pub provider: AccountId,
    pub token: AssetId,
    pub amount: u64,
}

/// Collateral released back to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralReleased {
    pub provider: AccountId,
    pub token: AssetId,
    pub amount: u64,
}

/// A reward payout to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsPaid {
    pub provider: AccountId,
    pub token: AssetId,
    pub amount: u64,
}

/// Enum wrapper for all exchange events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    OrderCreated(OrderCreated),
    OrderFilled(OrderFilled),
    OrderCancelled(OrderCancelled),
    FeesCollected(FeesCollected),
    LiquidityProviderRegistered(LiquidityProviderRegistered),
    LiquidityProviderDeactivated(LiquidityProviderDeactivated),
    IncentiveProgramCreated(IncentiveProgramCreated),
    IncentiveProgramUpdated(IncentiveProgramUpdated),
    CollateralLocked(CollateralLocked),
    CollateralReleased(CollateralReleased),
    RewardsPaid(RewardsPaid),
}
