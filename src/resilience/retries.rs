//! Retry across an instance group.
//!
//! # Responsibilities
//! - Pick the next instance round-robin for every attempt
//! - Retry dispatch failures immediately on the next instance
//! - Bound the whole sequence by an attempt count and a wall-clock deadline
//!
//! # Design Decisions
//! - No backoff: the next attempt goes to a different instance
//! - Business answers end the sequence; any instance would answer the same
//! - The deadline cancels the in-flight attempt rather than waiting it out;
//!   each attempt carries it down so the instance's breaker sees the expiry

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::endpoint::Endpoint;
use crate::error::{PricingError, PricingResult};
use crate::load_balancer::InstanceGroup;
use crate::observability::metrics;
use crate::pricing::types::PricingResponse;

/// Round-robin dispatch with bounded retry.
pub struct Retry<Req: Send + 'static> {
    group: InstanceGroup<Req>,
    max_attempts: u32,
    max_time: Duration,
}

impl<Req: Send + 'static> Retry<Req> {
    pub fn new(group: InstanceGroup<Req>, max_attempts: u32, max_time: Duration) -> Self {
        Self {
            group,
            max_attempts,
            max_time,
        }
    }

    pub fn from_config(group: InstanceGroup<Req>, config: &RetryConfig) -> Self {
        Self::new(group, config.max_attempts, config.max_time())
    }

    pub fn group(&self) -> &InstanceGroup<Req> {
        &self.group
    }
}

#[async_trait]
impl<Req> Endpoint<Req> for Retry<Req>
where
    Req: Clone + Send + Sync + 'static,
{
    async fn call(&self, request: Req) -> PricingResult<PricingResponse> {
        if self.group.is_empty() {
            return Err(PricingError::NoInstancesAvailable);
        }

        let deadline = Instant::now() + self.max_time;
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            let member = self.group.select()?;
            attempts += 1;
            if attempts > 1 {
                metrics::record_retry(self.group.name());
            }

            match member.endpoint.call_until(request.clone(), deadline).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        group = %self.group.name(),
                        instance = %member.instance,
                        attempt = attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if Instant::now() >= deadline {
                tracing::debug!(group = %self.group.name(), attempts, "Retry deadline reached");
                break;
            }
        }

        tracing::warn!(group = %self.group.name(), attempts, "Retries exhausted");
        Err(PricingError::ExhaustedRetries {
            attempts,
            last: last_error.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::Member;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays a fixed outcome and counts calls.
    struct Scripted {
        calls: AtomicUsize,
        outcome: PricingResult<PricingResponse>,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(outcome: PricingResult<PricingResponse>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
                delay: None,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(PricingResponse::ok(1.0)),
                delay: Some(delay),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Endpoint<u32> for Scripted {
        async fn call(&self, _request: u32) -> PricingResult<PricingResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }
    }

    fn down() -> PricingResult<PricingResponse> {
        Err(PricingError::Transport("connection refused".into()))
    }

    fn retry(endpoints: &[Arc<Scripted>]) -> Retry<u32> {
        let members = endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| Member {
                instance: format!("host:{}", 8081 + i),
                endpoint: e.clone() as Arc<dyn Endpoint<u32>>,
            })
            .collect();
        Retry::from_config(InstanceGroup::new("retail", members), &RetryConfig::default())
    }

    #[tokio::test]
    async fn test_fails_over_to_next_instance() {
        let a = Scripted::new(down());
        let b = Scripted::new(Ok(PricingResponse::ok(194.85)));
        let retry = retry(&[a.clone(), b.clone()]);

        assert_eq!(retry.call(1).await.unwrap().total, 194.85);
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let a = Scripted::new(down());
        let b = Scripted::new(down());
        let retry = retry(&[a.clone(), b.clone()]);

        let err = retry.call(1).await.unwrap_err();
        match err {
            PricingError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last.as_deref(), Some(PricingError::Transport(_))));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!((a.calls(), b.calls()), (2, 1));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let a = Scripted::new(Err(PricingError::CodeNotFound));
        let b = Scripted::new(Ok(PricingResponse::ok(1.0)));
        let retry = retry(&[a.clone(), b.clone()]);

        assert_eq!(retry.call(1).await.unwrap_err(), PricingError::CodeNotFound);
        assert_eq!((a.calls(), b.calls()), (1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_the_sequence() {
        let slow = Scripted::slow(Duration::from_secs(1));
        let retry = retry(&[slow.clone()]);

        let started = Instant::now();
        let err = retry.call(1).await.unwrap_err();
        assert!(matches!(err, PricingError::ExhaustedRetries { attempts: 1, .. }));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(250) && elapsed < Duration::from_secs(1));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_group() {
        let retry = retry(&[]);
        assert_eq!(retry.call(1).await.unwrap_err(), PricingError::NoInstancesAvailable);
    }

    #[tokio::test]
    async fn test_cursor_advances_across_calls() {
        let a = Scripted::new(Ok(PricingResponse::ok(1.0)));
        let b = Scripted::new(Ok(PricingResponse::ok(2.0)));
        let c = Scripted::new(Ok(PricingResponse::ok(3.0)));
        let retry = retry(&[a.clone(), b.clone(), c.clone()]);

        for _ in 0..6 {
            retry.call(1).await.unwrap();
        }
        assert_eq!((a.calls(), b.calls(), c.calls()), (2, 2, 2));
    }
}
