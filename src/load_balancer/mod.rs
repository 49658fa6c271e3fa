//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway operation (retail | wholesale)
//!     → group.rs (endpoints of every configured instance)
//!     → round_robin.rs (rotate through instances)
//!     → instance.rs (address and base URL of the chosen instance)
//! ```
//!
//! # Design Decisions
//! - Instance set is fixed at startup; no discovery
//! - One group per operation so retail and wholesale never share state
//! - The cursor advances on every selection, success or failure

pub mod group;
pub mod instance;
pub mod round_robin;

pub use group::{InstanceGroup, Member};
pub use instance::Instance;
pub use round_robin::RoundRobin;

/// Strategy choosing the index of the next instance.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Index into a list of `len` instances, or `None` when it is empty.
    fn pick(&self, len: usize) -> Option<usize>;
}
