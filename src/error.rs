//! Error types for Valve

use thiserror::Error;

/// Result type for Valve operations
pub type Result<T> = std::result::Result<T, ValveError>;

/// Errors that can occur in Valve
#[derive(Debug, Error)]
pub enum ValveError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
