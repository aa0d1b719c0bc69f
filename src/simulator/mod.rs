//! Simulated venue
//!
//! Latency-delayed placement and fills of paper orders, one slot per role.

mod latency;
mod manager;
mod slot;

pub use latency::LatencyModel;
pub use manager::{SimulatedOrderManager, PRICE_TOLERANCE};
pub use slot::{SimulatedOrder, Slot};
