//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway and service metrics
//! - Install the Prometheus recorder rendered on `GET /metrics`
//! - Track per-instance and aggregate metrics
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by operation, outcome
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_requests_total` (counter): calls by instance, operation, outcome
//! - `gateway_upstream_duration_seconds` (histogram): per-instance latency
//! - `gateway_retries_total` (counter): attempts after the first, by group
//! - `gateway_rate_limited_total` (counter): calls refused by a token bucket
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `pricing_service_request_count` (counter): service calls by method, error
//! - `pricing_service_request_latency_seconds` (histogram): service latency
//!
//! Without an installed recorder every update is a no-op, so library code
//! and tests can record freely.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the global Prometheus recorder.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

fn describe() {
    ::metrics::describe_counter!("gateway_requests_total", "Inbound pricing requests");
    ::metrics::describe_histogram!(
        "gateway_request_duration_seconds",
        ::metrics::Unit::Seconds,
        "Inbound pricing request latency"
    );
    ::metrics::describe_counter!("gateway_upstream_requests_total", "Calls to price-service instances");
    ::metrics::describe_histogram!(
        "gateway_upstream_duration_seconds",
        ::metrics::Unit::Seconds,
        "Latency of calls to price-service instances"
    );
    ::metrics::describe_counter!("gateway_retries_total", "Attempts after the first");
    ::metrics::describe_counter!("gateway_rate_limited_total", "Calls refused by a rate limiter");
    ::metrics::describe_gauge!(
        "gateway_circuit_breaker_state",
        "Breaker state: 0 closed, 1 half-open, 2 open"
    );
    ::metrics::describe_counter!("pricing_service_request_count", "Pricing service calls");
    ::metrics::describe_histogram!(
        "pricing_service_request_latency_seconds",
        ::metrics::Unit::Seconds,
        "Pricing service call latency"
    );
}

/// Record one inbound request.
pub fn record_request(operation: &'static str, outcome: &'static str, start: Instant) {
    ::metrics::counter!("gateway_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "operation" => operation,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one call to an instance.
pub fn record_upstream(instance: &str, operation: &'static str, outcome: &'static str, start: Instant) {
    let instance = instance.to_string();
    ::metrics::counter!(
        "gateway_upstream_requests_total",
        "instance" => instance.clone(),
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_upstream_duration_seconds",
        "instance" => instance,
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(group: &str) {
    ::metrics::counter!("gateway_retries_total", "group" => group.to_string()).increment(1);
}

pub fn record_rate_limited(endpoint: &str) {
    ::metrics::counter!("gateway_rate_limited_total", "endpoint" => endpoint.to_string())
        .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    ::metrics::gauge!("gateway_circuit_breaker_state", "breaker" => breaker.to_string())
        .set(state.as_gauge());
}

/// Record one call through the service instrumenting middleware.
pub fn record_service_call(method: &'static str, error: bool, start: Instant) {
    let error = if error { "true" } else { "false" };
    ::metrics::counter!("pricing_service_request_count", "method" => method, "error" => error)
        .increment(1);
    ::metrics::histogram!(
        "pricing_service_request_latency_seconds",
        "method" => method,
        "error" => error
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            record_retry("retail");
            record_breaker_state("retail@a:1", CircuitState::Open);
            record_service_call("get_retail_total", false, Instant::now());
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"gateway_retries_total{group="retail"} 1"#));
        assert!(rendered.contains(r#"gateway_circuit_breaker_state{breaker="retail@a:1"}"#));
        assert!(rendered.contains("pricing_service_request_count"));
    }
}
