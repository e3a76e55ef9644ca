//! Request data model
//!
//! A request is created by the traffic generator at its arrival instant,
//! routed to exactly one server, and mutated only by that server: first the
//! service-start stamp, then the completion stamp. Completed requests are
//! retained in the server's completed list for aggregation and never revised.

use loadsim_core::SimTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Unique, monotonically increasing request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request({})", self.0)
    }
}

/// Server identifier (index into the coordinator's server list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub usize);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server({})", self.0)
    }
}

/// Request category; each kind draws its nominal service time from its own
/// configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    CpuBound,
    IoBound,
}

impl RequestKind {
    /// Short label used in statistics maps.
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::CpuBound => "CPU",
            RequestKind::IoBound => "IO",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One request flowing through the facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub kind: RequestKind,
    /// Virtual time at which the request arrived
    pub arrival_time: SimTime,
    /// Nominal service duration, sampled once at creation; the assigned
    /// server scales it by its speed multiplier
    pub service_time: Duration,
    /// Stamped by the server when the request enters service
    pub started_at: Option<SimTime>,
    /// Stamped by the server on completion; never revised once set
    pub completed_at: Option<SimTime>,
    /// The server the request was routed to
    pub server: Option<ServerId>,
}

impl Request {
    /// Create a request at its arrival instant.
    pub fn new(id: RequestId, kind: RequestKind, arrival_time: SimTime, service_time: Duration) -> Self {
        Self {
            id,
            kind,
            arrival_time,
            service_time,
            started_at: None,
            completed_at: None,
            server: None,
        }
    }

    /// Total response time (completion - arrival), if completed.
    pub fn response_time(&self) -> Option<Duration> {
        self.completed_at.map(|done| done.duration_since(self.arrival_time))
    }

    /// Time spent waiting in the queue (service start - arrival), if started.
    pub fn waiting_time(&self) -> Option<Duration> {
        self.started_at.map(|started| started.duration_since(self.arrival_time))
    }

    /// Actual elapsed service time (completion - service start), if completed.
    pub fn actual_service_time(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(done)) => Some(done.duration_since(started)),
            _ => None,
        }
    }

    /// Whether the request has a completion stamp.
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_at(arrival_ms: u64) -> Request {
        Request::new(
            RequestId(1),
            RequestKind::CpuBound,
            SimTime::from_millis(arrival_ms),
            Duration::from_millis(300),
        )
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = request_at(100);
        assert!(!request.is_completed());
        assert_eq!(request.response_time(), None);
        assert_eq!(request.waiting_time(), None);
        assert_eq!(request.actual_service_time(), None);
        assert_eq!(request.server, None);
    }

    #[test]
    fn test_derived_times() {
        let mut request = request_at(100);
        request.started_at = Some(SimTime::from_millis(150));
        request.completed_at = Some(SimTime::from_millis(450));

        assert_eq!(request.waiting_time(), Some(Duration::from_millis(50)));
        assert_eq!(request.response_time(), Some(Duration::from_millis(350)));
        assert_eq!(request.actual_service_time(), Some(Duration::from_millis(300)));
        assert!(request.is_completed());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(RequestKind::CpuBound.label(), "CPU");
        assert_eq!(RequestKind::IoBound.label(), "IO");
        assert_eq!(RequestKind::IoBound.to_string(), "IO");
    }
}
