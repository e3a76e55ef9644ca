//! Structured logging for simulation debugging
//!
//! Thin wrappers around `tracing-subscriber` that set sensible defaults for
//! simulation work. Log levels follow the usual convention:
//!
//! - TRACE: individual event processing and admission decisions
//! - DEBUG: scheduling decisions and component interactions
//! - INFO: run start/completion and aggregate results
//! - WARN/ERROR: unusual conditions
//!
//! The `RUST_LOG` environment variable overrides everything, e.g.
//! `RUST_LOG=loadsim_core::scheduler=trace,loadsim_components=debug`.

use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with sensible defaults (INFO and above).
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info")
}

/// Initialize logging with a specific level
///
/// # Arguments
/// * `level` - Log level: "trace", "debug", "info", "warn", or "error"
///
/// # Example
/// ```rust,no_run
/// use loadsim_core::logging::init_simulation_logging_with_level;
///
/// init_simulation_logging_with_level("debug");
/// ```
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("loadsim_core={level},loadsim_components={level}").into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();

    info!("Simulation logging initialized at level: {}", level);
}
