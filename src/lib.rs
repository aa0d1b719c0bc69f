//! Paper maker library
//!
//! Reconstructs YES/NO order books of a binary prediction market, detects
//! combined-price arbitrage, quotes inventory-skewed bids and runs them
//! through a latency-simulated paper venue.

pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod metrics;
pub mod orderbook;
pub mod parser;
pub mod publisher;
pub mod quoting;
pub mod simulator;

pub use bus::{EventBus, TaskHandle};
pub use config::Config;
pub use engine::{Engine, EngineHandle};
pub use error::{EngineError, Result};
pub use events::{ArbitrageSignal, Event, Fill, Market, Quote, Role};
pub use metrics::EngineMetrics;
pub use orderbook::{ArbitrageAnalyzer, OrderBook, Side};
pub use parser::ParsedMessage;
pub use publisher::Publisher;
pub use quoting::QuoteEngine;
pub use simulator::SimulatedOrderManager;
