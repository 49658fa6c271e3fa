//! Instance group management.
//!
//! # Responsibilities
//! - Hold one endpoint per configured instance for a single operation
//! - Apply the load balancing algorithm to select an endpoint per call

use std::sync::Arc;

use crate::endpoint::Endpoint;
use crate::error::{PricingError, PricingResult};
use crate::load_balancer::{round_robin::RoundRobin, LoadBalancer};
use crate::pricing::types::PricingResponse;

/// One instance's endpoint and the label it is logged under.
pub struct Member<Req: Send + 'static, Resp: Send + 'static = PricingResponse> {
    pub instance: String,
    pub endpoint: Arc<dyn Endpoint<Req, Resp>>,
}

impl<Req: Send + 'static, Resp: Send + 'static> Clone for Member<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// The endpoints of every instance serving one operation.
pub struct InstanceGroup<Req: Send + 'static, Resp: Send + 'static = PricingResponse> {
    name: String,
    members: Vec<Member<Req, Resp>>,
    balancer: Box<dyn LoadBalancer>,
}

impl<Req, Resp> InstanceGroup<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Create a round-robin group.
    pub fn new(name: impl Into<String>, members: Vec<Member<Req, Resp>>) -> Self {
        Self::with_balancer(name, members, Box::new(RoundRobin::new()))
    }

    pub fn with_balancer(
        name: impl Into<String>,
        members: Vec<Member<Req, Resp>>,
        balancer: Box<dyn LoadBalancer>,
    ) -> Self {
        Self {
            name: name.into(),
            members,
            balancer,
        }
    }

    /// Select the member for the next attempt.
    pub fn select(&self) -> PricingResult<&Member<Req, Resp>> {
        match self.balancer.pick(self.members.len()) {
            Some(index) => Ok(&self.members[index]),
            None => {
                tracing::debug!(group = %self.name, "No instances configured in group");
                Err(PricingError::NoInstancesAvailable)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Instance labels in rotation order.
    pub fn instances(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.instance.as_str()).collect()
    }
}
