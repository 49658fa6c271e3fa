//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID, scope it for outbound calls)
//!     → handlers.rs (decode body, call the PricingService, encode payload)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::AppState;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
