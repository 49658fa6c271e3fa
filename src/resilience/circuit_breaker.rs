//! Circuit breaker for instance protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: instance assumed down, requests fail fast
//! - Half-Open: testing if instance recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures > threshold, or failure rate crossed
//! Open → Half-Open: after cooldown
//! Half-Open → Closed: `half_open_max_requests` consecutive trial successes
//! Half-Open → Open: any trial failure
//! ```
//!
//! # Design Decisions
//! - Per-instance, per-operation breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Bounded trials in Half-Open (prevents hammering a recovering instance)
//! - Every state change starts a new generation; outcomes reported for an
//!   older generation are ignored

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::error::PricingError;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Gauge encoding: 0 closed, 1 half-open, 2 open.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Request tallies for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }
}

/// Tuning for a [`CircuitBreaker`].
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub half_open_max_requests: u32,
    pub interval: Option<Duration>,
    pub failure_rate_threshold: Option<f64>,
    pub minimum_requests: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            cooldown: config.cooldown(),
            half_open_max_requests: config.half_open_max_requests.max(1),
            interval: config.interval(),
            failure_rate_threshold: config.failure_rate_threshold,
            minimum_requests: config.minimum_requests,
        }
    }
}

impl BreakerSettings {
    fn ready_to_trip(&self, counts: &Counts) -> bool {
        if counts.consecutive_failures > self.failure_threshold {
            return true;
        }
        match self.failure_rate_threshold {
            Some(rate) if counts.requests >= self.minimum_requests.max(1) => {
                f64::from(counts.total_failures) / f64::from(counts.requests) >= rate
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    /// Closed: end of the counting interval. Open: end of the cooldown.
    expiry: Option<Instant>,
}

/// A three-state circuit breaker shared by every call routed to one instance.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        let now = Instant::now();
        let breaker = Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry: settings.interval.map(|i| now + i),
            }),
            settings,
        };
        metrics::record_breaker_state(&breaker.name, CircuitState::Closed);
        breaker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, applying any elapsed timer first.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    /// Tallies of the current generation.
    pub fn counts(&self) -> Counts {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, Instant::now());
        inner.counts
    }

    /// Admit a call or fail fast with [`PricingError::CircuitOpen`].
    ///
    /// The returned permit must be resolved with [`Permit::success`] or
    /// [`Permit::failure`]. A half-open trial permit dropped unresolved
    /// counts as a failure so the breaker cannot stay wedged half-open.
    pub fn try_acquire(&self) -> Result<Permit<'_>, PricingError> {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, Instant::now());

        match inner.state {
            CircuitState::Open => return Err(PricingError::CircuitOpen(self.name.clone())),
            CircuitState::HalfOpen
                if inner.counts.requests >= self.settings.half_open_max_requests =>
            {
                return Err(PricingError::CircuitOpen(self.name.clone()));
            }
            _ => {}
        }

        inner.counts.on_request();
        Ok(Permit {
            breaker: self,
            generation: inner.generation,
            trial: inner.state == CircuitState::HalfOpen,
            resolved: false,
        })
    }

    /// Trip the breaker regardless of counts.
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, CircuitState::Open, Instant::now());
    }

    fn on_success(&self, generation: u64) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);
        if inner.generation != generation {
            return;
        }

        inner.counts.on_success();
        if inner.state == CircuitState::HalfOpen
            && inner.counts.consecutive_successes >= self.settings.half_open_max_requests
        {
            self.transition(&mut inner, CircuitState::Closed, now);
        }
    }

    fn on_failure(&self, generation: u64) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.refresh(&mut inner, now);
        if inner.generation != generation {
            return;
        }

        inner.counts.on_failure();
        match inner.state {
            CircuitState::Closed if self.settings.ready_to_trip(&inner.counts) => {
                self.transition(&mut inner, CircuitState::Open, now);
            }
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open, now),
            _ => {}
        }
    }

    /// Apply timer-driven changes: interval rollover and cooldown expiry.
    fn refresh(&self, inner: &mut Inner, now: Instant) {
        match (inner.state, inner.expiry) {
            (CircuitState::Closed, Some(expiry)) if expiry <= now => {
                self.new_generation(inner, now);
            }
            (CircuitState::Open, Some(expiry)) if expiry <= now => {
                self.transition(inner, CircuitState::HalfOpen, now);
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        self.new_generation(inner, now);

        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = from.as_str(),
                cooldown_ms = self.settings.cooldown.as_millis() as u64,
                "Circuit opened"
            ),
            _ => tracing::info!(
                breaker = %self.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit state changed"
            ),
        }
        metrics::record_breaker_state(&self.name, to);
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation = inner.generation.wrapping_add(1);
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            CircuitState::Closed => self.settings.interval.map(|i| now + i),
            CircuitState::Open => Some(now + self.settings.cooldown),
            CircuitState::HalfOpen => None,
        };
    }
}

/// Admission ticket for one call through a [`CircuitBreaker`].
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    resolved: bool,
}

impl Permit<'_> {
    pub fn success(mut self) {
        self.resolved = true;
        self.breaker.on_success(self.generation);
    }

    pub fn failure(mut self) {
        self.resolved = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.resolved && self.trial {
            self.breaker.on_failure(self.generation);
        }
    }
}
