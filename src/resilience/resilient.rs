//! Per-instance protection wrapped around a single endpoint.
//!
//! # Responsibilities
//! - Refuse calls when the instance's token bucket is empty
//! - Fail fast while the instance's circuit is open
//! - Report each outcome back to the breaker
//!
//! The limiter is checked first, so a throttled call never occupies a
//! half-open trial slot. Only transport failures count against the breaker;
//! a business answer proves the instance is alive. A call cut off by the
//! retry deadline is a transport failure like any other.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::{CircuitBreakerConfig, RateLimitConfig};
use crate::endpoint::Endpoint;
use crate::error::{ErrorKind, PricingError, PricingResult};
use crate::observability::metrics;
use crate::pricing::types::PricingResponse;
use crate::resilience::circuit_breaker::{BreakerSettings, CircuitBreaker};
use crate::resilience::rate_limit::RateLimiter;

/// Endpoint guarded by an optional rate limiter and circuit breaker.
pub struct ResilientEndpoint<Req, E> {
    label: String,
    inner: E,
    limiter: Option<RateLimiter>,
    breaker: Option<Arc<CircuitBreaker>>,
    _request: PhantomData<fn(Req)>,
}

impl<Req, E> ResilientEndpoint<Req, E>
where
    Req: Send + 'static,
    E: Endpoint<Req>,
{
    /// Wrap `inner` with no protection; add it with the builder methods.
    pub fn new(label: impl Into<String>, inner: E) -> Self {
        Self {
            label: label.into(),
            inner,
            limiter: None,
            breaker: None,
            _request: PhantomData,
        }
    }

    /// Wrap `inner` with the limiter and breaker that `config` enables.
    pub fn from_config(
        label: impl Into<String>,
        inner: E,
        rate_limit: &RateLimitConfig,
        circuit_breaker: &CircuitBreakerConfig,
    ) -> Self {
        let mut endpoint = Self::new(label, inner);
        if rate_limit.enabled {
            endpoint = endpoint.with_rate_limiter(RateLimiter::from_config(rate_limit));
        }
        if circuit_breaker.enabled {
            let breaker = CircuitBreaker::new(
                endpoint.label.clone(),
                BreakerSettings::from(circuit_breaker),
            );
            endpoint = endpoint.with_circuit_breaker(Arc::new(breaker));
        }
        endpoint
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }
}

impl<Req, E> ResilientEndpoint<Req, E>
where
    Req: Send + 'static,
    E: Endpoint<Req>,
{
    async fn dispatch(
        &self,
        request: Req,
        deadline: Option<Instant>,
    ) -> PricingResult<PricingResponse> {
        if let Some(limiter) = &self.limiter {
            if !limiter.try_acquire() {
                tracing::debug!(endpoint = %self.label, "Rate limit exceeded");
                metrics::record_rate_limited(&self.label);
                return Err(PricingError::RateLimitExceeded(self.label.clone()));
            }
        }

        let permit = match &self.breaker {
            Some(breaker) => Some(breaker.try_acquire().inspect_err(|_| {
                tracing::debug!(endpoint = %self.label, "Circuit open, failing fast");
            })?),
            None => None,
        };

        // Expiry has to resolve the permit, so the deadline lives in here.
        let result = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.inner.call(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(PricingError::Transport(format!(
                        "{}: deadline exceeded",
                        self.label
                    ))),
                }
            }
            None => self.inner.call(request).await,
        };

        if let Some(permit) = permit {
            match &result {
                Err(e) if e.kind() == ErrorKind::Transport => permit.failure(),
                _ => permit.success(),
            }
        }
        result
    }
}

#[async_trait]
impl<Req, E> Endpoint<Req> for ResilientEndpoint<Req, E>
where
    Req: Send + 'static,
    E: Endpoint<Req>,
{
    async fn call(&self, request: Req) -> PricingResult<PricingResponse> {
        self.dispatch(request, None).await
    }

    async fn call_until(&self, request: Req, deadline: Instant) -> PricingResult<PricingResponse> {
        self.dispatch(request, Some(deadline)).await
    }
}
