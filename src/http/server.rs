//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ListenerConfig;
use crate::http::handlers::{
    health_handler, metrics_handler, retail_handler, wholesale_handler, AppState,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::pricing::service::PricingService;

/// HTTP server exposing a [`PricingService`].
///
/// The gateway serves a `PricingGateway`; each price-service instance serves
/// its local service stack. Both speak the same routes.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(
        config: &ListenerConfig,
        service: Arc<dyn PricingService>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let state = AppState {
            service,
            metrics,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/retail", post(retail_handler))
            .route("/wholesale", post(wholesale_handler))
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::catalog::Catalog;
    use crate::pricing::service::LocalPricingService;

    async fn serve() -> String {
        let service = LocalPricingService::new(Catalog::new().with_product("aaa111", 12.99));
        let server = HttpServer::new(&ListenerConfig::default(), Arc::new(service), None);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.run(listener, std::future::pending()));
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_request_id_is_echoed_or_generated() {
        let base = serve().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/retail"))
            .header("x-request-id", "req-42")
            .body(r#"{"code":"aaa111","qty":1}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.headers()["x-request-id"], "req-42");

        let resp = client.get(format!("{base}/health")).send().await.unwrap();
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_request() {
        let base = serve().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/retail"))
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), r#"{"err":"Invalid Request"}"#);
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let base = serve().await;
        let resp = reqwest::get(format!("{base}/metrics")).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
