//! Issuance-layer error types
//!
//! Error taxonomy for ledger, issuer, and registry operations. Every
//! precondition is checked at operation entry; any failure aborts the call
//! before its first write.

use thiserror::Error;

/// Ledger-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Caller is not the ledger owner")]
    OwnerOnly,

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount exceeds the signed 64-bit interop ceiling")]
    AmountTooLarge,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },
}

/// Issuer-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuerError {
    #[error("Caller is not the issuer owner")]
    OwnerOnly,

    #[error("Account is not whitelisted")]
    NotWhitelisted,

    #[error("Amount must be positive")]
    NonPositive,

    #[error("Dividend pool is short: required {required}, available {available}")]
    InsufficientPool { required: u64, available: u64 },

    #[error("Caller holds no security tokens")]
    NoShares,

    #[error("Entitlement already withdrawn")]
    NothingToClaim,

    #[error("Votes exceed share balance: requested {requested}, held {held}")]
    InsufficientBalance { requested: u64, held: u64 },

    #[error("Cumulative dividends exceed the interop ceiling")]
    AmountTooLarge,

    #[error("Treasury USDT balance already initialized")]
    AlreadyInitialized,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Registry-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Caller is not the registry owner")]
    OwnerOnly,

    #[error("Company name must be non-empty")]
    InvalidCompanyName,

    #[error("Company already registered: {company}")]
    DuplicateCompany { company: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
