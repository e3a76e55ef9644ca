//! Error types for the simulation engine

use thiserror::Error;

/// Top-level error type for simulation operations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Component error: {0}")]
    Component(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
