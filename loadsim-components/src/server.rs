//! Server: a bounded service node with a FIFO wait queue
//!
//! A server is the classic bounded-semaphore-with-waiters pattern made
//! explicit: an in-service set limited by `capacity` plus a FIFO queue of
//! requests waiting for a slot. All mutation goes through [`Server::admit`]
//! and [`Server::finish`], which the coordinator invokes from the single
//! event-processing thread; releasing a slot and admitting the next waiter
//! happen inside one `finish` call, so no other event can ever observe a free
//! slot ahead of a queued request.

use crate::request::{Request, RequestId, ServerId};
use loadsim_core::SimTime;
use loadsim_metrics::stats;
use loadsim_metrics::ServerMetrics;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Outcome of offering a request to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A slot was free; service started immediately (wait time zero).
    /// The caller schedules the completion after `completes_in`.
    Started { completes_in: Duration },
    /// All slots busy; the request joined the FIFO queue and will be admitted
    /// in arrival order as slots free up.
    Queued,
}

/// One service node with finite concurrent-service capacity.
#[derive(Debug)]
pub struct Server {
    id: ServerId,
    capacity: usize,
    /// Speed multiplier: actual service time = nominal / cpu_power
    cpu_power: f64,
    queue: VecDeque<Request>,
    in_service: Vec<Request>,
    completed: Vec<Request>,
    total_processing_time: Duration,
    total_waiting_time: Duration,
}

impl Server {
    /// Create a server.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `cpu_power` is not positive.
    pub fn new(id: ServerId, capacity: usize, cpu_power: f64) -> Self {
        assert!(capacity >= 1, "Server capacity must be at least 1");
        assert!(cpu_power > 0.0, "Server speed must be positive");
        Self {
            id,
            capacity,
            cpu_power,
            queue: VecDeque::new(),
            in_service: Vec::new(),
            completed: Vec::new(),
            total_processing_time: Duration::ZERO,
            total_waiting_time: Duration::ZERO,
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cpu_power(&self) -> f64 {
        self.cpu_power
    }

    /// Offer a request to this server at virtual time `now`.
    pub fn admit(&mut self, request: Request, now: SimTime) -> Admission {
        if self.in_service.len() < self.capacity {
            let completes_in = self.start_service(request, now);
            Admission::Started { completes_in }
        } else {
            trace!(server = %self.id, request = %request.id, queue_len = self.queue.len() + 1,
                "All slots busy, request queued");
            self.queue.push_back(request);
            Admission::Queued
        }
    }

    /// Complete the in-service request `id` at virtual time `now`.
    ///
    /// The freed slot is handed to the head of the queue in the same call;
    /// if a waiter was admitted, returns its id and its actual service
    /// duration so the caller can schedule the follow-on completion.
    pub fn finish(&mut self, id: RequestId, now: SimTime) -> Option<(RequestId, Duration)> {
        let pos = self
            .in_service
            .iter()
            .position(|r| r.id == id)
            .expect("Completion event for a request not in service");
        let mut request = self.in_service.swap_remove(pos);
        request.completed_at = Some(now);

        if let Some(actual) = request.actual_service_time() {
            self.total_processing_time += actual;
        }
        if let Some(waited) = request.waiting_time() {
            self.total_waiting_time += waited;
        }
        trace!(server = %self.id, request = %request.id, time = %now, "Request completed");
        self.completed.push(request);

        self.queue.pop_front().map(|next| {
            let next_id = next.id;
            let completes_in = self.start_service(next, now);
            (next_id, completes_in)
        })
    }

    /// Stamp the request into service and return its actual (speed-scaled)
    /// service duration. Capacity must have been checked by the caller.
    fn start_service(&mut self, mut request: Request, now: SimTime) -> Duration {
        request.started_at = Some(now);
        request.server = Some(self.id);
        let completes_in = Duration::from_secs_f64(request.service_time.as_secs_f64() / self.cpu_power);
        trace!(server = %self.id, request = %request.id, time = %now,
            service_secs = completes_in.as_secs_f64(), "Request entered service");
        self.in_service.push(request);
        debug_assert!(self.in_service.len() <= self.capacity);
        completes_in
    }

    /// Number of requests waiting for a slot.
    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    /// Number of requests currently in service.
    pub fn in_service_count(&self) -> usize {
        self.in_service.len()
    }

    /// Current load: in-service count / capacity, in [0, 1].
    pub fn load(&self) -> f64 {
        self.in_service.len() as f64 / self.capacity as f64
    }

    /// Whether any request is currently in service.
    pub fn is_busy(&self) -> bool {
        !self.in_service.is_empty()
    }

    /// Requests this server has completed, in completion order.
    pub fn completed(&self) -> &[Request] {
        &self.completed
    }

    /// Total busy time accumulated over the run.
    pub fn total_processing_time(&self) -> Duration {
        self.total_processing_time
    }

    /// Metrics over completed requests only; an all-zero record (apart from
    /// identity and current-state fields) when nothing has completed yet.
    pub fn metrics(&self) -> ServerMetrics {
        let mut record = ServerMetrics {
            server_id: self.id.0,
            current_queue_length: self.queue_length(),
            current_load: self.load(),
            cpu_power: self.cpu_power,
            capacity: self.capacity,
            ..ServerMetrics::default()
        };
        if self.completed.is_empty() {
            return record;
        }

        let response: Vec<f64> = self
            .completed
            .iter()
            .filter_map(|r| r.response_time())
            .map(|d| d.as_secs_f64())
            .collect();
        let waiting: Vec<f64> = self
            .completed
            .iter()
            .filter_map(|r| r.waiting_time())
            .map(|d| d.as_secs_f64())
            .collect();
        let processing: Vec<f64> = self
            .completed
            .iter()
            .filter_map(|r| r.actual_service_time())
            .map(|d| d.as_secs_f64())
            .collect();

        let completions: Vec<f64> = self
            .completed
            .iter()
            .filter_map(|r| r.completed_at)
            .map(|t| t.as_secs_f64())
            .collect();
        let first = completions.iter().copied().fold(f64::INFINITY, f64::min);
        let last = completions.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        record.processed_count = self.completed.len();
        record.avg_response_time = stats::mean(&response);
        record.avg_waiting_time = stats::mean(&waiting);
        record.avg_processing_time = stats::mean(&processing);
        record.throughput = self.completed.len() as f64 / stats::floored_span(first, last);
        record.total_processing_time = self.total_processing_time.as_secs_f64();
        record
    }
}
