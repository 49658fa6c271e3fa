//! Pricing gateway.
//!
//! Serves `/retail` and `/wholesale` by dispatching to a fixed list of
//! price-service instances with round-robin, bounded retry, per-instance
//! circuit breakers and per-instance rate limits.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use pricing_gateway::config::loader::{load_config, ConfigError};
use pricing_gateway::config::validation::validate_config;
use pricing_gateway::config::{GatewayConfig, InstanceList};
use pricing_gateway::endpoint::build_client;
use pricing_gateway::lifecycle::{spawn_signal_handler, shutdown, Shutdown};
use pricing_gateway::observability::{init_metrics, init_tracing};
use pricing_gateway::{HttpServer, PricingGateway};

#[derive(Parser)]
#[command(name = "pricing-gateway")]
#[command(about = "Resilient gateway in front of price-service instances", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. `:8080`
    #[arg(long)]
    listen: Option<String>,

    /// Comma-separated list of price-service instances
    #[arg(long)]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = &cli.listen {
        config.listener.set_listen(listen);
    }
    if let Some(proxy) = &cli.proxy {
        config.instances = InstanceList::parse(proxy);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_tracing(&config.observability)?;
    tracing::info!("pricing-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let metrics = if config.observability.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    let client = build_client(&config.upstream);
    let gateway = PricingGateway::from_config(&config, client)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        instances = config.instances.len(),
        "Listening for connections"
    );

    let coordinator = Arc::new(Shutdown::new());
    let stop = coordinator.subscribe();
    spawn_signal_handler(coordinator);

    let server = HttpServer::new(&config.listener, Arc::new(gateway), metrics);
    server.run(listener, shutdown::wait(stop)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
