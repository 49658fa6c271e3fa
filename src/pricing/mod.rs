//! Pricing domain.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → middleware.rs (logging, instrumenting)
//!     → service.rs (validation, lookup)
//!     → catalog.rs (prices, discounts)
//!     → calculator.rs (totals, rounding)
//! ```

pub mod calculator;
pub mod catalog;
pub mod middleware;
pub mod service;
pub mod types;

pub use catalog::{Catalog, PriceLookup};
pub use middleware::{InstrumentingMiddleware, LoggingMiddleware};
pub use service::{LocalPricingService, PricingService};
pub use types::{ErrorResponse, PricingResponse, RetailRequest, WholesaleRequest};
