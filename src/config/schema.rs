//! Configuration schema definitions.
//!
//! This module defines the configuration structure for both binaries.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the pricing gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Ordered list of price-service instances (`host:port`).
    pub instances: InstanceList,

    /// Outbound call settings.
    pub upstream: UpstreamConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Per-instance rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Per-instance circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Root configuration for a price-service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listener: ListenerConfig,

    /// Path to the TOML catalog of product prices and partner discounts.
    pub catalog_path: String,

    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: "0.0.0.0:8081".to_string(),
                ..ListenerConfig::default()
            },
            catalog_path: "data/catalog.toml".to_string(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout for inbound calls in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ListenerConfig {
    /// Accepts `:8080` as shorthand for all interfaces.
    pub fn set_listen(&mut self, listen: &str) {
        self.bind_address = match listen.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => listen.to_string(),
        };
    }
}

/// Ordered list of instance addresses.
///
/// Deserializes from either a TOML array or a single comma-separated string,
/// matching the `--proxy` command-line flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InstanceListRepr")]
pub struct InstanceList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum InstanceListRepr {
    List(Vec<String>),
    Csv(String),
}

impl From<InstanceListRepr> for InstanceList {
    fn from(repr: InstanceListRepr) -> Self {
        match repr {
            InstanceListRepr::List(items) => InstanceList(
                items
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            InstanceListRepr::Csv(s) => InstanceList::parse(&s),
        }
    }
}

impl InstanceList {
    /// Split a comma-separated list, trimming whitespace and dropping blanks.
    pub fn parse(list: &str) -> Self {
        InstanceList(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for InstanceList {
    fn default() -> Self {
        InstanceList::parse("localhost:8081,localhost:8082,localhost:8083")
    }
}

/// Outbound call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Idle pooled connection lifetime in seconds.
    pub pool_idle_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 200,
            pool_idle_secs: 90,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,

    /// Wall-clock budget for the whole attempt sequence in milliseconds.
    pub max_time_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_time_ms: 250,
        }
    }
}

impl RetryConfig {
    pub fn max_time(&self) -> Duration {
        Duration::from_millis(self.max_time_ms)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Token refill rate per instance.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 100,
            burst_size: 100,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable circuit breaking.
    pub enabled: bool,

    /// The breaker trips once consecutive failures exceed this count.
    pub failure_threshold: u32,

    /// How long the breaker stays open before admitting trial calls.
    pub cooldown_ms: u64,

    /// Trial calls admitted while half-open; this many consecutive
    /// successes close the breaker again.
    pub half_open_max_requests: u32,

    /// Cyclic period for clearing closed-state counts (0 = never).
    pub interval_ms: u64,

    /// Optional failure ratio (0.0, 1.0] that also trips the breaker.
    pub failure_rate_threshold: Option<f64>,

    /// Requests observed before the failure ratio is considered.
    pub minimum_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            cooldown_ms: 60_000,
            half_open_max_requests: 1,
            interval_ms: 0,
            failure_rate_threshold: None,
            minimum_requests: 10,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
