//! Traffic generation: Poisson arrivals in constant or bursty regimes
//!
//! The generator is pull based. The coordinator asks for the next arrival
//! instant, schedules an event at it, and calls back to materialize the
//! request when the clock reaches that instant. All draws come from a
//! dedicated seeded stream so arrival sequences are reproducible per seed.

use crate::config::ServiceTimeRange;
use crate::error::ConfigError;
use crate::request::{Request, RequestId, RequestKind};
use loadsim_core::{Sampler, SimTime};
use loadsim_metrics::{stats, TrafficStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

/// Salt for deriving the generator's RNG stream from the run seed.
const TRAFFIC_SEED_SALT: u64 = 0x7AFF_1C5E_ED00_0002;

/// Probability that a new burst-mode interval is a burst rather than a
/// normal-rate interval.
const BURST_PROBABILITY: f64 = 0.3;
/// Burst interval length in seconds, drawn uniformly.
const BURST_DURATION_RANGE: (f64, f64) = (2.0, 5.0);
/// Multiplier applied to the base rate during a burst, drawn uniformly.
const BURST_RATE_MULTIPLIER_RANGE: (f64, f64) = (5.0, 10.0);
/// Quiet gap after a burst in seconds, drawn uniformly. No arrivals occur
/// during the gap.
const CALM_DURATION_RANGE: (f64, f64) = (3.0, 8.0);
/// Normal-rate interval length in seconds, drawn uniformly.
const NORMAL_DURATION_RANGE: (f64, f64) = (5.0, 15.0);

/// Arrival process shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficPattern {
    /// Poisson arrivals at the base rate for the whole run
    Constant,
    /// Alternating intervals: bursts at a multiplied rate followed by a
    /// quiet gap, or normal intervals at the base rate
    Burst,
}

impl TrafficPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficPattern::Constant => "constant",
            TrafficPattern::Burst => "burst",
        }
    }
}

impl fmt::Display for TrafficPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(TrafficPattern::Constant),
            "burst" => Ok(TrafficPattern::Burst),
            other => Err(ConfigError::UnknownPattern(other.to_string())),
        }
    }
}

/// Active interval of the bursty arrival process.
#[derive(Debug, Clone, Copy)]
enum Regime {
    /// Base-rate interval ending at `until`
    Normal { until: SimTime },
    /// Elevated-rate interval ending at `until`, followed by a quiet gap of
    /// `calm` before the next interval is drawn
    Burst { rate: f64, until: SimTime, calm: Duration },
}

/// Seeded arrival process that creates requests with sampled service demands.
pub struct TrafficGenerator {
    pattern: TrafficPattern,
    base_rate: f64,
    cpu_range: ServiceTimeRange,
    io_range: ServiceTimeRange,
    next_id: u64,
    regime: Option<Regime>,
    /// Arrival instants and kinds of every emitted request, kept for the
    /// end-of-run statistics
    arrivals: Vec<(SimTime, RequestKind)>,
    sampler: Sampler,
}

impl TrafficGenerator {
    pub fn new(
        pattern: TrafficPattern,
        base_rate: f64,
        cpu_range: ServiceTimeRange,
        io_range: ServiceTimeRange,
        seed: u64,
    ) -> Self {
        Self {
            pattern,
            base_rate,
            cpu_range,
            io_range,
            next_id: 1,
            regime: None,
            arrivals: Vec::new(),
            sampler: Sampler::derive(seed, TRAFFIC_SEED_SALT),
        }
    }

    pub fn pattern(&self) -> TrafficPattern {
        self.pattern
    }

    /// Number of requests emitted so far.
    pub fn total_requests(&self) -> usize {
        self.arrivals.len()
    }

    /// Next arrival instant strictly after `now` and strictly before `end`,
    /// or `None` when the process produces no further arrival inside the
    /// window.
    ///
    /// For the bursty pattern an inter-arrival gap that crosses the current
    /// interval's boundary is discarded and the process resumes at the start
    /// of the next interval, so intervals never bleed into each other.
    pub fn next_arrival(&mut self, now: SimTime, end: SimTime) -> Option<SimTime> {
        if now >= end {
            return None;
        }
        match self.pattern {
            TrafficPattern::Constant => {
                let candidate = now + Duration::from_secs_f64(self.sampler.exp_secs(self.base_rate));
                (candidate < end).then_some(candidate)
            }
            TrafficPattern::Burst => self.next_burst_arrival(now, end),
        }
    }

    fn next_burst_arrival(&mut self, now: SimTime, end: SimTime) -> Option<SimTime> {
        let mut cursor = now;
        loop {
            if cursor >= end {
                self.regime = None;
                return None;
            }
            let regime = match self.regime {
                Some(regime) => regime,
                None => {
                    let regime = self.draw_regime(cursor);
                    self.regime = Some(regime);
                    regime
                }
            };
            let (rate, until) = match regime {
                Regime::Normal { until } => (self.base_rate, until),
                Regime::Burst { rate, until, .. } => (rate, until),
            };
            let candidate = cursor + Duration::from_secs_f64(self.sampler.exp_secs(rate));
            if candidate < until && candidate < end {
                return Some(candidate);
            }
            // Interval exhausted: jump to its end (plus the quiet gap for
            // bursts) and draw a fresh interval there.
            cursor = match regime {
                Regime::Normal { until } => until,
                Regime::Burst { until, calm, .. } => until + calm,
            };
            self.regime = None;
        }
    }

    fn draw_regime(&mut self, start: SimTime) -> Regime {
        if self.sampler.chance(BURST_PROBABILITY) {
            let duration = self.sampler.uniform(BURST_DURATION_RANGE.0, BURST_DURATION_RANGE.1);
            let multiplier = self
                .sampler
                .uniform(BURST_RATE_MULTIPLIER_RANGE.0, BURST_RATE_MULTIPLIER_RANGE.1);
            let calm = self.sampler.uniform(CALM_DURATION_RANGE.0, CALM_DURATION_RANGE.1);
            let rate = self.base_rate * multiplier;
            debug!(start = %start, duration_secs = duration, rate, "Entering burst interval");
            Regime::Burst {
                rate,
                until: start + Duration::from_secs_f64(duration),
                calm: Duration::from_secs_f64(calm),
            }
        } else {
            let duration = self.sampler.uniform(NORMAL_DURATION_RANGE.0, NORMAL_DURATION_RANGE.1);
            trace!(start = %start, duration_secs = duration, "Entering normal interval");
            Regime::Normal {
                until: start + Duration::from_secs_f64(duration),
            }
        }
    }

    /// Materialize the request arriving at `at`. Ids start at 1 and increase
    /// by one per request; the kind is a fair coin flip and the nominal
    /// service time is drawn uniformly from the kind's configured range.
    pub fn emit(&mut self, at: SimTime) -> Request {
        let kind = if self.sampler.chance(0.5) {
            RequestKind::CpuBound
        } else {
            RequestKind::IoBound
        };
        let range = match kind {
            RequestKind::CpuBound => self.cpu_range,
            RequestKind::IoBound => self.io_range,
        };
        let service_secs = self.sampler.uniform(range.min_secs, range.max_secs);
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.arrivals.push((at, kind));
        trace!(request = %id, kind = %kind, at = %at, service_secs, "Request generated");
        Request::new(id, kind, at, Duration::from_secs_f64(service_secs))
    }

    /// Arrival-side statistics for the final report. All-zero counters when
    /// nothing was emitted; the pattern token is always present.
    pub fn statistics(&self) -> TrafficStats {
        let mut request_types: BTreeMap<String, usize> = BTreeMap::new();
        for (_, kind) in &self.arrivals {
            *request_types.entry(kind.label().to_string()).or_insert(0) += 1;
        }

        let (avg_arrival_rate, time_span) = match (self.arrivals.first(), self.arrivals.last()) {
            (Some((first, _)), Some((last, _))) => {
                let span = stats::floored_span(first.as_secs_f64(), last.as_secs_f64());
                (self.arrivals.len() as f64 / span, span)
            }
            _ => (0.0, 0.0),
        };

        TrafficStats {
            total_requests: self.arrivals.len(),
            pattern: self.pattern.as_str().to_string(),
            avg_arrival_rate,
            request_types,
            time_span,
        }
    }
}

impl fmt::Debug for TrafficGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficGenerator")
            .field("pattern", &self.pattern)
            .field("base_rate", &self.base_rate)
            .field("next_id", &self.next_id)
            .field("emitted", &self.arrivals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(pattern: TrafficPattern, rate: f64, seed: u64) -> TrafficGenerator {
        TrafficGenerator::new(
            pattern,
            rate,
            ServiceTimeRange::new(0.1, 0.5),
            ServiceTimeRange::new(0.05, 0.2),
            seed,
        )
    }

    fn drain_arrivals(generator: &mut TrafficGenerator, end: SimTime) -> Vec<SimTime> {
        let mut now = SimTime::zero();
        let mut arrivals = Vec::new();
        while let Some(at) = generator.next_arrival(now, end) {
            arrivals.push(at);
            now = at;
        }
        arrivals
    }

    #[test]
    fn test_pattern_tokens_parse() {
        assert_eq!("constant".parse::<TrafficPattern>().unwrap(), TrafficPattern::Constant);
        assert_eq!("burst".parse::<TrafficPattern>().unwrap(), TrafficPattern::Burst);
        assert!(matches!(
            "spiky".parse::<TrafficPattern>(),
            Err(ConfigError::UnknownPattern(_))
        ));
    }

    #[test]
    fn test_constant_arrivals_are_strictly_increasing_and_bounded() {
        let mut generator = generator(TrafficPattern::Constant, 5.0, 42);
        let end = SimTime::from_secs(20);
        let arrivals = drain_arrivals(&mut generator, end);
        assert!(!arrivals.is_empty());
        for window in arrivals.windows(2) {
            assert!(window[0] < window[1]);
        }
        assert!(*arrivals.last().unwrap() < end);
    }

    #[test]
    fn test_zero_window_produces_no_arrivals() {
        let mut generator = generator(TrafficPattern::Constant, 5.0, 42);
        assert_eq!(generator.next_arrival(SimTime::zero(), SimTime::zero()), None);
    }

    #[test]
    fn test_same_seed_same_arrival_sequence() {
        let end = SimTime::from_secs(30);
        let mut a = generator(TrafficPattern::Burst, 2.0, 7);
        let mut b = generator(TrafficPattern::Burst, 2.0, 7);
        assert_eq!(drain_arrivals(&mut a, end), drain_arrivals(&mut b, end));
    }

    #[test]
    fn test_burst_arrivals_stay_inside_window() {
        let mut generator = generator(TrafficPattern::Burst, 2.0, 11);
        let end = SimTime::from_secs(60);
        let arrivals = drain_arrivals(&mut generator, end);
        assert!(!arrivals.is_empty());
        for window in arrivals.windows(2) {
            assert!(window[0] < window[1]);
        }
        assert!(arrivals.iter().all(|&at| at < end));
    }

    #[test]
    fn test_emit_assigns_sequential_ids_from_one() {
        let mut generator = generator(TrafficPattern::Constant, 5.0, 42);
        let first = generator.emit(SimTime::from_secs(1));
        let second = generator.emit(SimTime::from_secs(2));
        assert_eq!(first.id, RequestId(1));
        assert_eq!(second.id, RequestId(2));
        assert_eq!(generator.total_requests(), 2);
    }

    #[test]
    fn test_emit_service_time_respects_kind_range() {
        let mut generator = generator(TrafficPattern::Constant, 5.0, 42);
        for i in 0..200 {
            let request = generator.emit(SimTime::from_millis(i * 10));
            let secs = request.service_time.as_secs_f64();
            match request.kind {
                RequestKind::CpuBound => assert!((0.1..=0.5).contains(&secs)),
                RequestKind::IoBound => assert!((0.05..=0.2).contains(&secs)),
            }
        }
    }

    #[test]
    fn test_statistics_zero_record_when_idle() {
        let generator = generator(TrafficPattern::Burst, 2.0, 42);
        let stats = generator.statistics();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.avg_arrival_rate, 0.0);
        assert_eq!(stats.time_span, 0.0);
        assert_eq!(stats.pattern, "burst");
        assert!(stats.request_types.is_empty());
    }

    #[test]
    fn test_statistics_counts_kinds_and_floors_span() {
        let mut generator = generator(TrafficPattern::Constant, 5.0, 42);
        // Two arrivals 100ms apart: the span floors to one second.
        generator.emit(SimTime::from_millis(100));
        generator.emit(SimTime::from_millis(200));
        let stats = generator.statistics();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.time_span, 1.0);
        assert_eq!(stats.avg_arrival_rate, 2.0);
        assert_eq!(stats.request_types.values().sum::<usize>(), 2);
    }
}
