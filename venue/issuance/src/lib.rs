//! Issuance layer for the security-token venue
//!
//! This crate implements the value-owning side of the venue: the ledger
//! (sole mutator of balances and supplies), per-SME issuers (whitelist,
//! dividend pool accounting, governance tallies), and the registry that
//! deploys and indexes issuers.
//!
//! # Modules
//! - `errors`: Ledger, issuer, and registry error taxonomies
//! - `events`: Issuance events and per-component event logs
//! - `security`: Ownership capability and reentrancy guard
//! - `ledger`: Balances, supplies, mint, atomic transfer
//! - `issuer`: Whitelist, dividends, governance votes
//! - `registry`: Issuer factory and lookup indexes

pub mod errors;
pub mod events;
pub mod security;
pub mod ledger;
pub mod issuer;
pub mod registry;

pub use issuer::Issuer;
pub use ledger::Ledger;
pub use registry::Registry;
