//! Quoting module
//!
//! Turns book snapshots into inventory-skewed BID quotes and tracks the
//! inventory built from simulated fills.

mod inventory;
pub mod pricing;
mod quote_engine;

pub use inventory::{Inventory, Position};
pub use pricing::{QuoteBreakdown, QuoteParams};
pub use quote_engine::QuoteEngine;
