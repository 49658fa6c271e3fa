//! Route handlers shared by the gateway and the price-service.
//!
//! Every outcome is answered with HTTP 200 and a JSON body: either the
//! `{total, err}` payload or `{"err":"Invalid Request"}` when the body cannot
//! be decoded. A call running past the listener's request timeout is answered
//! the same way, as a transport error.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PricingError, PricingResult};
use crate::http::request::{request_id, scope_request_id};
use crate::observability::metrics;
use crate::pricing::service::PricingService;
use crate::pricing::types::{ErrorResponse, PricingResponse, RetailRequest, WholesaleRequest};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn PricingService>,
    pub metrics: Option<PrometheusHandle>,
    /// Upper bound on one pricing call; expiry is answered like any error.
    pub request_timeout: Duration,
}

fn decode<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Option<T> {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Request body rejected");
            return None;
        }
    };
    match serde_json::from_slice(&body) {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::debug!(error = %e, "Undecodable request body");
            None
        }
    }
}

fn outcome(result: &PricingResult<f64>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    }
}

async fn within<F>(limit: Duration, call: F) -> PricingResult<f64>
where
    F: Future<Output = PricingResult<f64>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        tracing::warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
        Err(PricingError::Transport("request timed out".into()))
    })
}

fn invalid_request(operation: &'static str, start: Instant) -> Response {
    metrics::record_request(operation, "invalid_request", start);
    Json(ErrorResponse::invalid_request()).into_response()
}

pub async fn retail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let Some(request) = decode::<RetailRequest>(body) else {
        return invalid_request("retail", start);
    };

    let result = scope_request_id(
        request_id(&headers),
        within(
            state.request_timeout,
            state.service.get_retail_total(&request.code, request.qty),
        ),
    )
    .await;

    metrics::record_request("retail", outcome(&result), start);
    Json(PricingResponse::from(result)).into_response()
}

pub async fn wholesale_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let Some(request) = decode::<WholesaleRequest>(body) else {
        return invalid_request("wholesale", start);
    };

    let result = scope_request_id(
        request_id(&headers),
        within(
            state.request_timeout,
            state
                .service
                .get_wholesale_total(&request.partner, &request.code, request.qty),
        ),
    )
    .await;

    metrics::record_request("wholesale", outcome(&result), start);
    Json(PricingResponse::from(result)).into_response()
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (axum::http::StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Takes an hour to price anything.
    struct Stalled;

    #[async_trait]
    impl PricingService for Stalled {
        async fn get_retail_total(&self, _code: &str, _qty: i64) -> PricingResult<f64> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1.0)
        }

        async fn get_wholesale_total(
            &self,
            _partner: &str,
            _code: &str,
            _qty: i64,
        ) -> PricingResult<f64> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_json_error_with_status_200() {
        let state = AppState {
            service: Arc::new(Stalled),
            metrics: None,
            request_timeout: Duration::from_secs(30),
        };
        let body = Ok(Bytes::from_static(br#"{"partner":"superstore","code":"aaa111","qty":1}"#));

        let resp = wholesale_handler(State(state), HeaderMap::new(), body).await;
        assert_eq!(resp.status(), axum::http::StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let payload: PricingResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.total, 0.0);
        assert!(payload.err.unwrap().contains("request timed out"));
    }
}
