//! Configuration module for the paper maker

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Weight of the inventory skew applied to the micro-price
    pub risk_factor: Decimal,

    /// Half-spread subtracted from the reservation price to form a bid
    pub spread_margin: Decimal,

    /// Size of every simulated order
    pub order_size: Decimal,

    /// Simulated network latency window, inclusive on both ends
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,

    /// IPC socket path for publishing produced events
    pub ipc_socket_path: String,

    /// Port of the health/metrics server
    pub health_port: u16,

    /// Observer broadcast capacity
    pub event_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            risk_factor: var_or("RISK_FACTOR", defaults.risk_factor)?,
            spread_margin: var_or("SPREAD_MARGIN", defaults.spread_margin)?,
            order_size: var_or("ORDER_SIZE", defaults.order_size)?,
            latency_min_ms: var_or("LATENCY_MIN_MS", defaults.latency_min_ms)?,
            latency_max_ms: var_or("LATENCY_MAX_MS", defaults.latency_max_ms)?,
            ipc_socket_path: env::var("IPC_SOCKET_PATH").unwrap_or(defaults.ipc_socket_path),
            health_port: var_or("HEALTH_PORT", defaults.health_port)?,
            event_buffer: var_or("EVENT_BUFFER", defaults.event_buffer)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.latency_min_ms > self.latency_max_ms {
            return Err(EngineError::Config(format!(
                "LATENCY_MIN_MS ({}) exceeds LATENCY_MAX_MS ({})",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        if self.order_size <= Decimal::ZERO {
            return Err(EngineError::Config("ORDER_SIZE must be positive".to_string()));
        }
        if self.event_buffer == 0 {
            return Err(EngineError::Config("EVENT_BUFFER must be positive".to_string()));
        }
        Ok(())
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| EngineError::Config(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk_factor: Decimal::new(5, 2),
            spread_margin: Decimal::new(1, 2),
            order_size: Decimal::from(5),
            latency_min_ms: 0,
            latency_max_ms: 0,
            ipc_socket_path: "/tmp/paper-maker.sock".to_string(),
            health_port: 9090,
            event_buffer: 1024,
        }
    }
}
