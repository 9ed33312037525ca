//! Order book infrastructure module
//!
//! Price-ordered bid and ask queues. Each side is a price-indexed sorted map
//! whose values are FIFO queues of order ids, so equal-priced orders retain
//! insertion priority. Order records themselves live in the order book's
//! central map; the queues only carry ids.

pub mod ask_queue;
pub mod bid_queue;

pub use ask_queue::AskQueue;
pub use bid_queue::BidQueue;
