//! Endpoint abstraction shared by every layer of the dispatch chain.
//!
//! # Data Flow
//! ```text
//! PricingGateway
//!     → resilience::Retry            (round-robin + bounded retry)
//!     → load_balancer::InstanceGroup (one endpoint per instance)
//!     → resilience::ResilientEndpoint (rate limiter, then circuit breaker)
//!     → endpoint::RemoteEndpoint      (one HTTP round trip)
//! ```
//!
//! Every layer implements [`Endpoint`], so wrappers compose by holding the
//! next endpoint and forwarding the call.

pub mod remote;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

use crate::error::{PricingError, PricingResult};
use crate::pricing::types::PricingResponse;

pub use remote::{build_client, HttpClient, RemoteEndpoint};

/// A callable unit: one request in, one response or failure out.
#[async_trait]
pub trait Endpoint<Req, Resp = PricingResponse>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req) -> PricingResult<Resp>;

    /// Like [`call`](Endpoint::call), but gives up at `deadline` with a
    /// transport error. Guarding layers override this so an expired call is
    /// still reported to them as a failure.
    async fn call_until(&self, request: Req, deadline: Instant) -> PricingResult<Resp> {
        match tokio::time::timeout_at(deadline, self.call(request)).await {
            Ok(result) => result,
            Err(_) => Err(PricingError::Transport("deadline exceeded".into())),
        }
    }
}

#[async_trait]
impl<Req, Resp, E> Endpoint<Req, Resp> for Arc<E>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    E: Endpoint<Req, Resp> + ?Sized,
{
    async fn call(&self, request: Req) -> PricingResult<Resp> {
        (**self).call(request).await
    }

    async fn call_until(&self, request: Req, deadline: Instant) -> PricingResult<Resp> {
        (**self).call_until(request, deadline).await
    }
}

/// The two remote pricing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Retail,
    Wholesale,
}

impl Operation {
    /// HTTP path served by every price-service instance.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Retail => "/retail",
            Operation::Wholesale => "/wholesale",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Retail => "retail",
            Operation::Wholesale => "wholesale",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request type bound to the operation that serves it.
pub trait OperationRequest: Serialize + Clone + Send + Sync + fmt::Debug + 'static {
    const OPERATION: Operation;
}
