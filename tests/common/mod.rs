//! Shared utilities for integration and load testing.

use async_trait::async_trait;
use axum::{http::StatusCode, Router};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use pricing_gateway::config::{GatewayConfig, InstanceList, ListenerConfig};
use pricing_gateway::endpoint::build_client;
use pricing_gateway::pricing::{Catalog, LocalPricingService};
use pricing_gateway::{HttpServer, PricingGateway, PricingResult, PricingService};

/// A running mock price-service instance.
#[allow(dead_code)]
pub struct MockInstance {
    pub addr: String,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockInstance {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
pub fn test_catalog() -> Catalog {
    Catalog::new()
        .with_product("aaa111", 12.99)
        .with_product("bbb222", 2.90)
        .with_product("ccc333", 22.50)
        .with_partner("superstore", 0.15)
        .with_partner("joesdiscount", 0.05)
}

/// Local service that counts every call reaching it.
struct Counting {
    inner: LocalPricingService<Catalog>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PricingService for Counting {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_retail_total(code, qty).await
    }

    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_wholesale_total(partner, code, qty).await
    }
}

/// Serve `service` on an ephemeral port and return its address.
pub async fn serve(service: Arc<dyn PricingService>) -> String {
    let server = HttpServer::new(&ListenerConfig::default(), service, None);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(server.run(listener, std::future::pending()));
    addr
}

/// Start a real price-service backed by [`test_catalog`].
#[allow(dead_code)]
pub async fn start_price_service() -> MockInstance {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = Counting {
        inner: LocalPricingService::new(test_catalog()),
        calls: calls.clone(),
    };
    let addr = serve(Arc::new(service)).await;
    MockInstance { addr, calls }
}

/// Start an instance whose every reply is produced by `f(call_index)`.
#[allow(dead_code)]
pub async fn start_programmable_instance<F, Fut>(f: F) -> MockInstance
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);
    let counter = calls.clone();

    let router = Router::new().fallback(move || {
        let f = f.clone();
        let counter = counter.clone();
        async move {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let (status, body) = f(index).await;
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            (status, [("content-type", "application/json")], body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    MockInstance { addr, calls }
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

#[allow(dead_code)]
pub fn gateway_config(instances: &[&str]) -> GatewayConfig {
    GatewayConfig {
        instances: InstanceList(instances.iter().map(|s| s.to_string()).collect()),
        ..GatewayConfig::default()
    }
}

#[allow(dead_code)]
pub fn build_gateway(config: &GatewayConfig) -> Arc<PricingGateway> {
    let client = build_client(&config.upstream);
    Arc::new(PricingGateway::from_config(config, client).unwrap())
}

/// Serve a gateway over HTTP and return its base URL.
#[allow(dead_code)]
pub async fn start_gateway(gateway: Arc<PricingGateway>) -> String {
    format!("http://{}", serve(gateway).await)
}

/// HTTP client that ignores proxy environment variables.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
