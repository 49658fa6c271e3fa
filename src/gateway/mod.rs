//! Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → proxy.rs (validate, dispatch, map remote errors, round)
//!     → resilience::Retry per operation
//! ```
//!
//! # Design Decisions
//! - Retail and wholesale never share breaker, limiter or cursor state
//! - Instance list and per-instance state are built once and never change

pub mod proxy;

pub use proxy::{endpoint_label, PricingGateway};
