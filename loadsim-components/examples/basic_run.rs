//! Runs the same workload under each balancing policy and prints the reports.
//!
//! ```sh
//! RUST_LOG=info cargo run --example basic_run
//! ```

use loadsim_components::{run_simulation, Policy, SimulationConfig, TrafficPattern};
use loadsim_core::{init_simulation_logging, SimError};

fn main() -> Result<(), SimError> {
    init_simulation_logging();

    for policy in [Policy::Random, Policy::RoundRobin, Policy::ShortestQueue] {
        let config = SimulationConfig {
            duration_secs: 60.0,
            traffic_rate: 4.0,
            pattern: TrafficPattern::Burst,
            policy,
            server_count: 3,
            server_capacity: 1,
            ..Default::default()
        };
        let report = run_simulation(&config)?;
        println!("=== policy: {policy} ===");
        println!(
            "processed {} of {} requests, avg response {:.3}s (std {:.3}s), utilization {:.1}%",
            report.system_metrics.total_processed,
            report.traffic_stats.total_requests,
            report.system_metrics.avg_response_time,
            report.system_metrics.response_time_std,
            report.system_metrics.system_utilization * 100.0,
        );
        println!(
            "distribution variance {:.2}, per server: {:?}",
            report.load_balancer_stats.distribution_variance,
            report.load_balancer_stats.requests_per_server,
        );
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| SimError::Internal(e.to_string()))?;
        println!("{json}\n");
    }
    Ok(())
}
