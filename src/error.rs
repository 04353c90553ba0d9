//! Error types for hexkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HexError
pub type Result<T> = std::result::Result<T, HexError>;

/// Unified error type for hexkv operations
#[derive(Debug, Error)]
pub enum HexError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Key already exists")]
    DuplicateKey,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Capacity exhausted: {0}")]
    CapacityExhausted(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
