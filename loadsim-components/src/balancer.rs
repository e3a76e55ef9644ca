//! Load balancer: stateful routing policy over the server pool
//!
//! The balancer never mutates a server; it only inspects queue lengths for
//! its decisions and completed counts for its fairness statistics. Random
//! selection draws from a dedicated seeded stream so policies stay
//! deterministic given the run seed.

use crate::error::ConfigError;
use crate::request::{Request, ServerId};
use crate::server::Server;
use loadsim_core::Sampler;
use loadsim_metrics::{stats, LoadBalancerStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Salt for deriving the balancer's RNG stream from the run seed.
const BALANCER_SEED_SALT: u64 = 0xBA1A_4CE5_EED0_0001;

/// Load balancing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Uniform choice over all servers, independent of load
    Random,
    /// Cyclic selection via an internal cursor
    RoundRobin,
    /// Server with the minimum current queue length; ties go to the first
    /// occurrence in server-list order
    ShortestQueue,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Random => "random",
            Policy::RoundRobin => "round_robin",
            Policy::ShortestQueue => "shortest_queue",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Policy::Random),
            "round_robin" => Ok(Policy::RoundRobin),
            "shortest_queue" => Ok(Policy::ShortestQueue),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Policy engine that picks a target server for each arriving request.
pub struct LoadBalancer {
    policy: Policy,
    /// Round-robin cursor, advanced modulo the server count after each call
    cursor: usize,
    total_requests: u64,
    sampler: Sampler,
}

impl LoadBalancer {
    pub fn new(policy: Policy, seed: u64) -> Self {
        Self {
            policy,
            cursor: 0,
            total_requests: 0,
            sampler: Sampler::derive(seed, BALANCER_SEED_SALT),
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Switch policy mid-run; takes effect on the next `select` call and does
    /// not reshuffle already-routed requests.
    pub fn set_policy(&mut self, policy: Policy) {
        debug!(from = %self.policy, to = %policy, "Load balancing policy changed");
        self.policy = policy;
    }

    /// Total `select` calls so far.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Pick a target server for `request`.
    ///
    /// # Panics
    ///
    /// Panics if `servers` is empty.
    pub fn select(&mut self, request: &Request, servers: &[Server]) -> ServerId {
        assert!(!servers.is_empty(), "Cannot balance over zero servers");
        self.total_requests += 1;

        let target = match self.policy {
            Policy::Random => servers[self.sampler.index(servers.len())].id(),
            Policy::RoundRobin => {
                let target = servers[self.cursor % servers.len()].id();
                self.cursor = (self.cursor + 1) % servers.len();
                target
            }
            Policy::ShortestQueue => {
                // min_by_key keeps the first of equal minima: stable tie-break.
                servers
                    .iter()
                    .min_by_key(|s| s.queue_length())
                    .map(Server::id)
                    .expect("Server pool is non-empty")
            }
        };
        trace!(policy = %self.policy, request = %request.id, target = %target, "Routed request");
        target
    }

    /// Per-server completed counts and their population variance, the
    /// fairness signal used when comparing policies.
    pub fn distribution_stats(&self, servers: &[Server]) -> LoadBalancerStats {
        let requests_per_server: BTreeMap<usize, usize> = servers
            .iter()
            .map(|s| (s.id().0, s.completed().len()))
            .collect();
        let counts: Vec<f64> = requests_per_server.values().map(|&c| c as f64).collect();

        LoadBalancerStats {
            policy: self.policy.as_str().to_string(),
            total_requests_distributed: self.total_requests,
            distribution_variance: stats::population_variance(&counts),
            requests_per_server,
        }
    }
}
