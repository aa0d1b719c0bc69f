//! Order book module
//!
//! Reconstructs per-asset books from feed deltas and watches the YES/NO
//! pair for combined-price arbitrage.

mod arbitrage;
mod book;

pub use arbitrage::{evaluate, ArbitrageAnalyzer};
pub use book::OrderBook;

use serde::{Deserialize, Serialize};

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}
