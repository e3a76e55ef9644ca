//! Result records and statistics helpers for the load-balance simulator
//!
//! This crate defines the serializable records a finished simulation run
//! produces, consumed by reporting and analysis collaborators, plus the small
//! numeric helpers (means, variances, floored spans) shared by the components
//! that compute them. It contains no scheduling logic.

pub mod report;
pub mod stats;

pub use report::{
    LoadBalancerStats, ServerMetrics, SimulationReport, SystemMetrics, TrafficStats,
};
