//! The pricing gateway: a [`PricingService`] backed by remote instances.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::endpoint::{Endpoint, HttpClient, OperationRequest, RemoteEndpoint};
use crate::error::PricingResult;
use crate::load_balancer::instance::{Instance, InstanceError};
use crate::load_balancer::{InstanceGroup, Member};
use crate::pricing::calculator::round_cents;
use crate::pricing::service::{validate_retail, validate_wholesale, PricingService};
use crate::pricing::types::{RetailRequest, WholesaleRequest};
use crate::resilience::{CircuitBreaker, ResilientEndpoint, Retry};

/// Dispatches retail and wholesale calls to their own instance groups.
///
/// Arguments are validated locally first, so an invalid call never costs an
/// attempt, a token or a breaker slot.
pub struct PricingGateway {
    retail: Arc<dyn Endpoint<RetailRequest>>,
    wholesale: Arc<dyn Endpoint<WholesaleRequest>>,
    breakers: Vec<Arc<CircuitBreaker>>,
}

impl PricingGateway {
    /// Assemble a gateway from ready-made dispatch endpoints.
    pub fn new(
        retail: Arc<dyn Endpoint<RetailRequest>>,
        wholesale: Arc<dyn Endpoint<WholesaleRequest>>,
    ) -> Self {
        Self {
            retail,
            wholesale,
            breakers: Vec::new(),
        }
    }

    /// Build the full dispatch chain for every configured instance.
    pub fn from_config(config: &GatewayConfig, client: HttpClient) -> Result<Self, InstanceError> {
        let instances = config
            .instances
            .as_slice()
            .iter()
            .map(|address| Instance::parse(address))
            .collect::<Result<Vec<_>, _>>()?;

        let mut breakers = Vec::new();
        let retail = build_group::<RetailRequest>(&instances, &client, config, &mut breakers);
        let wholesale = build_group::<WholesaleRequest>(&instances, &client, config, &mut breakers);

        tracing::info!(
            instances = ?config.instances.as_slice(),
            max_attempts = config.retries.max_attempts,
            max_time_ms = config.retries.max_time_ms,
            "Pricing gateway configured"
        );

        Ok(Self {
            retail: Arc::new(Retry::from_config(retail, &config.retries)),
            wholesale: Arc::new(Retry::from_config(wholesale, &config.retries)),
            breakers,
        })
    }

    /// Every breaker, labelled `operation@host:port`.
    pub fn circuit_breakers(&self) -> &[Arc<CircuitBreaker>] {
        &self.breakers
    }

    pub fn circuit_breaker(&self, label: &str) -> Option<&Arc<CircuitBreaker>> {
        self.breakers.iter().find(|b| b.name() == label)
    }
}

/// Breaker and limiter label for one instance and operation.
pub fn endpoint_label<Req: OperationRequest>(instance: &Instance) -> String {
    format!("{}@{}", Req::OPERATION, instance.address())
}

fn build_group<Req: OperationRequest>(
    instances: &[Instance],
    client: &HttpClient,
    config: &GatewayConfig,
    breakers: &mut Vec<Arc<CircuitBreaker>>,
) -> InstanceGroup<Req> {
    let members = instances
        .iter()
        .map(|instance| {
            let remote = RemoteEndpoint::<Req>::new(instance.clone(), client.clone());
            let endpoint = ResilientEndpoint::from_config(
                endpoint_label::<Req>(instance),
                remote,
                &config.rate_limit,
                &config.circuit_breaker,
            );
            if let Some(breaker) = endpoint.circuit_breaker() {
                breakers.push(breaker.clone());
            }
            Member {
                instance: instance.address().to_string(),
                endpoint: Arc::new(endpoint) as Arc<dyn Endpoint<Req>>,
            }
        })
        .collect();

    InstanceGroup::new(Req::OPERATION.as_str(), members)
}

#[async_trait]
impl PricingService for PricingGateway {
    #[tracing::instrument(name = "gateway_retail", skip(self))]
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        validate_retail(code, qty)?;
        let request = RetailRequest {
            code: code.to_string(),
            qty,
        };
        let response = self.retail.call(request).await?;
        response.into_result().map(round_cents)
    }

    #[tracing::instrument(name = "gateway_wholesale", skip(self))]
    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        validate_wholesale(partner, code, qty)?;
        let request = WholesaleRequest {
            partner: partner.to_string(),
            code: code.to_string(),
            qty,
        };
        let response = self.wholesale.call(request).await?;
        response.into_result().map(round_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceList;
    use crate::error::PricingError;
    use crate::pricing::types::PricingResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a fixed payload and counts calls.
    struct Canned {
        calls: AtomicUsize,
        response: PricingResponse,
    }

    impl Canned {
        fn new(response: PricingResponse) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response,
            })
        }
    }

    #[async_trait]
    impl<Req: Send + 'static> Endpoint<Req> for Canned {
        async fn call(&self, _request: Req) -> PricingResult<PricingResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_dispatch() {
        let canned = Canned::new(PricingResponse::ok(1.0));
        let gateway = PricingGateway::new(canned.clone(), canned.clone());

        assert_eq!(gateway.get_retail_total("", 1).await, Err(PricingError::InvalidCode));
        assert_eq!(gateway.get_retail_total("aaa111", 0).await, Err(PricingError::InvalidQuantity));
        assert_eq!(
            gateway.get_wholesale_total("", "aaa111", 1).await,
            Err(PricingError::InvalidPartner)
        );
        assert_eq!(canned.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_errors_map_back_to_kinds() {
        let missing_partner = Canned::new(PricingResponse::from_error(&PricingError::PartnerNotFound));
        let gateway = PricingGateway::new(missing_partner.clone(), missing_partner);
        assert_eq!(
            gateway.get_wholesale_total("nobody", "aaa111", 1).await,
            Err(PricingError::PartnerNotFound)
        );

        let odd = Canned::new(PricingResponse {
            total: 0.0,
            err: Some("warehouse on fire".into()),
        });
        let gateway = PricingGateway::new(odd.clone(), odd);
        assert_eq!(
            gateway.get_retail_total("aaa111", 1).await,
            Err(PricingError::Rejected("warehouse on fire".into()))
        );
    }

    #[tokio::test]
    async fn test_total_is_rounded() {
        let canned = Canned::new(PricingResponse::ok(194.849_999_9));
        let gateway = PricingGateway::new(canned.clone(), canned);
        assert_eq!(gateway.get_retail_total("aaa111", 15).await, Ok(194.85));
    }

    #[tokio::test]
    async fn test_from_config_registers_breakers() {
        let config = GatewayConfig {
            instances: InstanceList::parse("localhost:8081,localhost:8082"),
            ..GatewayConfig::default()
        };
        let client = crate::endpoint::build_client(&config.upstream);
        let gateway = PricingGateway::from_config(&config, client).unwrap();

        assert_eq!(gateway.circuit_breakers().len(), 4);
        assert!(gateway.circuit_breaker("retail@localhost:8082").is_some());
        assert!(gateway.circuit_breaker("wholesale@localhost:8081").is_some());
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_instance() {
        let config = GatewayConfig {
            instances: InstanceList::parse("localhost"),
            ..GatewayConfig::default()
        };
        let client = crate::endpoint::build_client(&config.upstream);
        assert!(PricingGateway::from_config(&config, client).is_err());
    }
}
