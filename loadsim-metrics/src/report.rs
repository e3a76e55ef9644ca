//! Serializable result records produced by a simulation run
//!
//! Field layout follows what reporting and comparison collaborators consume.
//! All times are f64 virtual-time seconds. Maps are ordered so serialized
//! output is stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global system metrics over all completed requests of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Requests that reached completion anywhere in the system
    pub total_processed: usize,
    /// Completions per second over the (floored) first-to-last completion span
    pub system_throughput: f64,
    /// Mean of completion - arrival
    pub avg_response_time: f64,
    /// Mean of service start - arrival
    pub avg_waiting_time: f64,
    /// Sum of per-server busy time / (elapsed time x server count)
    pub system_utilization: f64,
    /// Sample standard deviation (Bessel) of response times; 0 below 2 samples
    pub response_time_std: f64,
}

/// Per-server metrics over that server's completed requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetrics {
    pub server_id: usize,
    pub processed_count: usize,
    pub avg_response_time: f64,
    pub avg_waiting_time: f64,
    /// Mean actual (speed-scaled) service time
    pub avg_processing_time: f64,
    /// Queue length at aggregation time
    pub current_queue_length: usize,
    /// In-service count / capacity at aggregation time, in [0, 1]
    pub current_load: f64,
    /// Completions per second over the (floored) completion span
    pub throughput: f64,
    /// Speed multiplier applied to nominal service times
    pub cpu_power: f64,
    pub capacity: usize,
    /// Total busy time accumulated over the run, seconds
    pub total_processing_time: f64,
}

/// Routing fairness statistics from the load balancer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerStats {
    /// Policy in effect at aggregation time ("random", "round_robin", "shortest_queue")
    pub policy: String,
    /// Total select() calls over the run
    pub total_requests_distributed: u64,
    /// Completed-request count per server id
    pub requests_per_server: BTreeMap<usize, usize>,
    /// Population variance of the per-server counts; 0 iff all counts equal
    pub distribution_variance: f64,
}

/// Arrival-side statistics from the traffic generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub total_requests: usize,
    /// Pattern in effect ("constant", "burst")
    pub pattern: String,
    /// Generated count / span between first and last arrival (span floored at 1.0)
    pub avg_arrival_rate: f64,
    /// Generated count per request category ("CPU", "IO")
    pub request_types: BTreeMap<String, usize>,
    /// Floored first-to-last arrival span, seconds
    pub time_span: f64,
}

/// Complete result record of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Reporting instant after the drain phase; at least the configured duration
    pub simulation_time: f64,
    pub system_metrics: SystemMetrics,
    pub server_metrics: Vec<ServerMetrics>,
    pub load_balancer_stats: LoadBalancerStats,
    pub traffic_stats: TrafficStats,
}
