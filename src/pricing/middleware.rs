//! Decorators around any [`PricingService`].
//!
//! Each wrapper holds the next service and forwards the call, so they stack
//! in any order:
//!
//! ```text
//! LoggingMiddleware → InstrumentingMiddleware → LocalPricingService
//! ```

use async_trait::async_trait;
use std::time::Instant;

use crate::error::PricingResult;
use crate::observability::metrics;
use crate::pricing::service::PricingService;

/// Emits one structured event per call.
pub struct LoggingMiddleware<S> {
    next: S,
}

impl<S: PricingService> LoggingMiddleware<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

#[async_trait]
impl<S: PricingService> PricingService for LoggingMiddleware<S> {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        let start = Instant::now();
        let result = self.next.get_retail_total(code, qty).await;
        let took_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(total) => tracing::info!(method = "get_retail_total", code, qty, total, took_us),
            Err(e) => tracing::info!(method = "get_retail_total", code, qty, error = %e, took_us),
        }
        result
    }

    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        let start = Instant::now();
        let result = self.next.get_wholesale_total(partner, code, qty).await;
        let took_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(total) => {
                tracing::info!(method = "get_wholesale_total", partner, code, qty, total, took_us)
            }
            Err(e) => {
                tracing::info!(method = "get_wholesale_total", partner, code, qty, error = %e, took_us)
            }
        }
        result
    }
}

/// Counts calls and records latency, labelled by method and error flag.
pub struct InstrumentingMiddleware<S> {
    next: S,
}

impl<S: PricingService> InstrumentingMiddleware<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

#[async_trait]
impl<S: PricingService> PricingService for InstrumentingMiddleware<S> {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        let start = Instant::now();
        let result = self.next.get_retail_total(code, qty).await;
        metrics::record_service_call("get_retail_total", result.is_err(), start);
        result
    }

    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        let start = Instant::now();
        let result = self.next.get_wholesale_total(partner, code, qty).await;
        metrics::record_service_call("get_wholesale_total", result.is_err(), start);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PricingError;
    use crate::pricing::catalog::Catalog;
    use crate::pricing::service::LocalPricingService;

    #[tokio::test]
    async fn test_stack_is_transparent() {
        let svc = LoggingMiddleware::new(InstrumentingMiddleware::new(LocalPricingService::new(
            Catalog::new()
                .with_product("aaa111", 12.99)
                .with_partner("superstore", 0.15),
        )));

        assert_eq!(svc.get_retail_total("aaa111", 15).await, Ok(194.85));
        assert_eq!(
            svc.get_wholesale_total("superstore", "aaa111", 15).await,
            Ok(165.62)
        );
        assert_eq!(
            svc.get_retail_total("zzz999", 1).await,
            Err(PricingError::CodeNotFound)
        );
    }
}
