//! Load-balance simulation components.
//!
//! Builds the facility model on top of the `loadsim-core` engine: bounded
//! [`Server`]s with FIFO wait queues, a routing [`LoadBalancer`], a seeded
//! [`TrafficGenerator`], and the [`run_simulation`] coordinator that wires
//! them onto one virtual clock and produces a [`SimulationReport`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use loadsim_components::{run_simulation, SimulationConfig};
//!
//! let report = run_simulation(&SimulationConfig::default())?;
//! println!("{} requests processed", report.system_metrics.total_processed);
//! ```

pub mod balancer;
pub mod config;
pub mod error;
pub mod facility;
pub mod request;
pub mod server;
pub mod traffic;

pub use balancer::{LoadBalancer, Policy};
pub use config::{ServiceTimeRange, SimulationConfig};
pub use error::ConfigError;
pub use facility::{run_simulation, Facility, FacilityEvent};
pub use loadsim_metrics::SimulationReport;
pub use request::{Request, RequestId, RequestKind, ServerId};
pub use server::{Admission, Server};
pub use traffic::{TrafficGenerator, TrafficPattern};
