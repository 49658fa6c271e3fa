//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call for one operation:
//!     → retries.rs (pick instance, retry on dispatch failure, enforce deadline)
//!     → resilient.rs (per instance guard)
//!         → rate_limit.rs (take a token or refuse)
//!         → circuit_breaker.rs (fail fast while open, record outcome)
//! ```
//!
//! # Design Decisions
//! - The deadline covers the whole attempt sequence, not each attempt
//! - Guard state lives per instance and per operation
//! - Rejections by a guard are retryable on the next instance

pub mod circuit_breaker;
pub mod rate_limit;
pub mod resilient;
pub mod retries;

pub use circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitState};
pub use rate_limit::RateLimiter;
pub use resilient::ResilientEndpoint;
pub use retries::Retry;
