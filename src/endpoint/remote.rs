//! Remote endpoint: one HTTP round trip to one instance.
//!
//! # Responsibilities
//! - Encode the request as JSON and POST it to the instance's operation path
//! - Decode the `{total, err}` payload
//! - Classify connection, status and decode failures as transport errors
//!
//! A payload with a non-empty `err` is a successful round trip; turning it
//! into an error is left to the gateway.

use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::UpstreamConfig;
use crate::endpoint::{Endpoint, OperationRequest};
use crate::error::{PricingError, PricingResult, INVALID_RESPONSE};
use crate::http::request::{current_request_id, X_REQUEST_ID};
use crate::load_balancer::instance::Instance;
use crate::observability::metrics;
use crate::pricing::types::PricingResponse;

/// Upper bound on an upstream response body.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Pooled HTTP client shared by all remote endpoints.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the outbound client from configuration.
pub fn build_client(config: &UpstreamConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(config.connect_timeout()));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_secs))
        .build(connector)
}

/// Calls one operation on one instance.
pub struct RemoteEndpoint<Req> {
    instance: Instance,
    url: String,
    client: HttpClient,
    _request: PhantomData<fn(Req)>,
}

impl<Req: OperationRequest> RemoteEndpoint<Req> {
    pub fn new(instance: Instance, client: HttpClient) -> Self {
        let url = instance.url_for(Req::OPERATION.path());
        Self {
            instance,
            url,
            client,
            _request: PhantomData,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    fn build_request(&self, request: &Req) -> PricingResult<Request<Body>> {
        let body = serde_json::to_vec(request)
            .map_err(|e| PricingError::Transport(format!("encode request: {}", e)))?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(&self.url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(request_id) = current_request_id() {
            builder = builder.header(X_REQUEST_ID, request_id);
        }

        builder
            .body(Body::from(body))
            .map_err(|e| PricingError::Transport(format!("build request: {}", e)))
    }

    async fn round_trip(&self, request: &Req) -> PricingResult<PricingResponse> {
        let req = self.build_request(request)?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| PricingError::Transport(format!("{}: {}", self.instance, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PricingError::Transport(format!(
                "{}: unexpected status {}",
                self.instance, status
            )));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| PricingError::Transport(format!("{}: read body: {}", self.instance, e)))?;

        serde_json::from_slice::<PricingResponse>(&bytes).map_err(|e| {
            tracing::debug!(instance = %self.instance, error = %e, "Undecodable upstream payload");
            PricingError::Transport(INVALID_RESPONSE.to_string())
        })
    }
}

#[async_trait]
impl<Req: OperationRequest> Endpoint<Req> for RemoteEndpoint<Req> {
    #[tracing::instrument(
        name = "remote_call",
        skip(self, request),
        fields(instance = %self.instance, operation = %Req::OPERATION)
    )]
    async fn call(&self, request: Req) -> PricingResult<PricingResponse> {
        let start = Instant::now();
        let result = self.round_trip(&request).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "transport_error",
        };
        metrics::record_upstream(self.instance.address(), Req::OPERATION.as_str(), outcome, start);

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Upstream call failed");
        }
        result
    }
}
