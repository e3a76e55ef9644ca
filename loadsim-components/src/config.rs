//! Run configuration
//!
//! A validated, serializable description of one simulation run. Defaults give
//! a small three-server facility under moderate constant load.

use crate::balancer::Policy;
use crate::error::ConfigError;
use crate::traffic::TrafficPattern;
use serde::{Deserialize, Serialize};

/// Inclusive range of nominal service times in seconds for one request kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceTimeRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl ServiceTimeRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() || self.min_secs <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "{name} bounds must be finite and positive"
            )));
        }
        if self.min_secs > self.max_secs {
            return Err(ConfigError::InvalidValue(format!(
                "{name} minimum {} exceeds maximum {}",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }
}

/// Full description of one run. `validate` must pass before the coordinator
/// will accept it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Length of the measured window in virtual seconds
    pub duration_secs: f64,
    /// Base arrival rate in requests per second
    pub traffic_rate: f64,
    pub policy: Policy,
    pub pattern: TrafficPattern,
    pub server_count: usize,
    /// Concurrent requests each server processes before queueing
    pub server_capacity: usize,
    /// Speed multiplier applied to every server; 2.0 halves service times
    pub server_speed: f64,
    pub cpu_bound_range: ServiceTimeRange,
    pub io_bound_range: ServiceTimeRange,
    /// Root seed; every random stream in the run derives from it
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 100.0,
            traffic_rate: 2.0,
            policy: Policy::RoundRobin,
            pattern: TrafficPattern::Constant,
            server_count: 3,
            server_capacity: 1,
            server_speed: 1.0,
            cpu_bound_range: ServiceTimeRange::new(0.1, 0.5),
            io_bound_range: ServiceTimeRange::new(0.05, 0.2),
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "duration must be finite and non-negative, got {}",
                self.duration_secs
            )));
        }
        if !self.traffic_rate.is_finite() || self.traffic_rate <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "traffic rate must be positive, got {}",
                self.traffic_rate
            )));
        }
        if self.server_count == 0 {
            return Err(ConfigError::InvalidValue(
                "at least one server is required".to_string(),
            ));
        }
        if self.server_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "server capacity must be at least 1".to_string(),
            ));
        }
        if !self.server_speed.is_finite() || self.server_speed <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "server speed must be positive, got {}",
                self.server_speed
            )));
        }
        self.cpu_bound_range.validate("CPU-bound service time")?;
        self.io_bound_range.validate("IO-bound service time")?;
        Ok(())
    }
}
