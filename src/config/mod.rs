//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line overrides (binaries)
//!     → GatewayConfig / ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the instance set is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    CircuitBreakerConfig, GatewayConfig, InstanceList, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, RetryConfig, ServiceConfig, UpstreamConfig,
};
