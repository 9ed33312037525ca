//! Issuance events
//!
//! Events are immutable records appended by issuance operations. Each
//! component keeps its own append-only log; a failed call never logs.

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, AssetId};

/// A new issuer exchange was deployed through the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDeployed {
    pub owner: AccountId,
    pub issuer: AssetId,
    pub company_name: String,
}

/// A security token was created with its initial supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreated {
    pub security_token: AssetId,
    pub name: String,
    pub symbol: String,
    pub initial_supply: u64,
}

/// Whitelist membership changed for an investor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareholderWhitelisted {
    pub investor: AccountId,
    pub status: bool,
}

/// A dividend distribution was recorded against the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendsDistributed {
    pub amount: u64,
}

/// A shareholder withdrew their dividend entitlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendClaimed {
    pub shareholder: AccountId,
    pub amount: u64,
}

/// A governance vote tally was assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceVoteCasted {
    pub voter: AccountId,
    pub votes: u64,
}

/// Value moved between two accounts on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensTransferred {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u64,
}

/// Enum wrapper for all issuance events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuanceEvent {
    ExchangeDeployed(ExchangeDeployed),
    TokenCreated(TokenCreated),
    ShareholderWhitelisted(ShareholderWhitelisted),
    DividendsDistributed(DividendsDistributed),
    DividendClaimed(DividendClaimed),
    GovernanceVoteCasted(GovernanceVoteCasted),
    TokensTransferred(TokensTransferred),
}
