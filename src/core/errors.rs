//! Core error types

use thiserror::Error;

/// Core protocol-engine errors
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("framing error: {0}")]
    FramingError(String),

    #[error("transport error: {0}")]
    TransportError(String),
}

impl CoreError {
    pub fn framing(msg: impl Into<String>) -> Self {
        Self::FramingError(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
