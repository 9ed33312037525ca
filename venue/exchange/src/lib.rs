//! Exchange layer for the security-token venue
//!
//! Implements the continuous double-auction order book with its matching
//! engine and fee routing, and the market-maker incentive module that locks
//! collateral and pays rewards against a spread obligation read from the
//! book.
//!
//! Each external operation is one atomic, serializable step: preconditions
//! are checked before the first write, value moves only through the ledger,
//! and a reentrancy guard rejects nested value-moving calls.
//!
//! # Modules
//! - `errors`: Order book and incentive error taxonomies
//! - `events`: Exchange events and per-component event logs
//! - `book`: Price-ordered bid/ask queues with per-level FIFO
//! - `matching`: Crossing predicates and integer fill settlement
//! - `orderbook`: Submission, matching, cancellation, views, fee admin
//! - `incentive`: Provider registry, collateral lockup, spread obligation

pub mod errors;
pub mod events;
pub mod book;
pub mod matching;
pub mod orderbook;
pub mod incentive;

pub use incentive::IncentiveModule;
pub use orderbook::OrderBook;
