//! Exchange-layer error types
//!
//! Every precondition is checked at operation entry; a failed call aborts
//! before its first write and emits no event. The matcher's per-counter-order
//! decisions (skip, expire) are normal control flow, not errors.

use issuance::errors::LedgerError;
use thiserror::Error;

/// Order book errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderBookError {
    #[error("Amount and price must be positive")]
    NonPositive,

    #[error("Amount exceeds the signed 64-bit interop ceiling")]
    AmountTooLarge,

    #[error("No issuer registered for this security token")]
    UnknownToken,

    #[error("Caller is not whitelisted with the issuer")]
    NotWhitelisted,

    #[error("Order not found: {order_id}")]
    UnknownOrder { order_id: u64 },

    #[error("Caller is not the order maker")]
    NotOwner,

    #[error("Order is not open")]
    NotOpen,

    #[error("Order has not yet exceeded the maximum order age")]
    NotExpired,

    #[error("Trading fee above 100 bps")]
    FeeTooHigh,

    #[error("Caller is not the order book owner")]
    OwnerOnly,

    #[error("Account must not be the nil sentinel")]
    InvalidAccount,

    #[error("Reentrant call rejected")]
    Reentrancy,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Incentive module errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("Provider already registered")]
    AlreadyRegistered,

    #[error("Caller is not an active provider")]
    NotActiveProvider,

    #[error("No incentive program for this security token")]
    UnknownProgram,

    #[error("Program has ended or is inactive")]
    ProgramEnded,

    #[error("Program is still active")]
    ProgramStillActive,

    #[error("No collateral locked for this program")]
    NoCollateral,

    #[error("Rate must be positive")]
    NonPositive,

    #[error("Value out of range")]
    InvalidAmount,

    #[error("No reward claimable")]
    NothingToClaim,

    #[error("Caller is not the incentive module owner")]
    OwnerOnly,

    #[error("Reentrant call rejected")]
    Reentrancy,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
