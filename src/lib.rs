//! Pricing gateway library.
//!
//! A resilient front door for a fleet of price-service instances, plus the
//! price-service itself.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client ──▶ http (axum) ──▶ gateway ──▶ resilience::Retry (round-robin, 3 tries, 250ms)
//!                                              │
//!                                              ▼
//!                               load_balancer::InstanceGroup
//!                                              │
//!                                              ▼
//!                     resilience::ResilientEndpoint (rate limit → circuit breaker)
//!                                              │
//!                                              ▼
//!                         endpoint::RemoteEndpoint ──▶ price-service instance
//!                                                          │
//!                                                          ▼
//!                                  http ──▶ pricing middleware ──▶ LocalPricingService
//! ```

// Core subsystems
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;

// Domain
pub mod gateway;
pub mod pricing;

// Traffic management
pub mod load_balancer;
pub mod resilience;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{GatewayConfig, ServiceConfig};
pub use error::{ErrorKind, PricingError, PricingResult};
pub use gateway::PricingGateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pricing::PricingService;
