//! Error types for simulation components

use loadsim_core::SimError;
use thiserror::Error;

/// Errors raised while validating or parsing a run configuration.
///
/// Unknown policy/pattern tokens fail fast at selection time; they are never
/// silently defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown load balancing policy: {0}")]
    UnknownPolicy(String),

    #[error("Unknown traffic pattern: {0}")]
    UnknownPattern(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::Configuration(err.to_string())
    }
}
