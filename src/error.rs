//! Error types for the paper maker

use thiserror::Error;

/// Paper maker errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("Malformed number in field `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Engine mailbox closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Parse(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for EngineError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for EngineError {
    fn from(err: prometheus::Error) -> Self {
        EngineError::Metrics(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Ipc(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
