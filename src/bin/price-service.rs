//! A price-service instance: prices requests against a local catalog.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use pricing_gateway::config::loader::{load_service_config, ConfigError};
use pricing_gateway::config::validation::validate_service_config;
use pricing_gateway::config::ServiceConfig;
use pricing_gateway::lifecycle::{shutdown, spawn_signal_handler, Shutdown};
use pricing_gateway::observability::{init_metrics, init_tracing};
use pricing_gateway::pricing::{
    Catalog, InstrumentingMiddleware, LocalPricingService, LoggingMiddleware,
};
use pricing_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "price-service")]
#[command(about = "Retail and wholesale pricing backend", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. `:8081`
    #[arg(long)]
    listen: Option<String>,

    /// Catalog of product prices and partner discounts
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_service_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(listen) = &cli.listen {
        config.listener.set_listen(listen);
    }
    if let Some(catalog) = &cli.catalog {
        config.catalog_path = catalog.display().to_string();
    }
    validate_service_config(&config).map_err(ConfigError::Validation)?;

    init_tracing(&config.observability)?;
    tracing::info!("price-service v{} starting", env!("CARGO_PKG_VERSION"));

    let metrics = if config.observability.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    let catalog = Catalog::load(Path::new(&config.catalog_path))?;
    let service = LoggingMiddleware::new(InstrumentingMiddleware::new(LocalPricingService::new(
        catalog,
    )));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let coordinator = Arc::new(Shutdown::new());
    let stop = coordinator.subscribe();
    spawn_signal_handler(coordinator);

    let server = HttpServer::new(&config.listener, Arc::new(service), metrics);
    server.run(listener, shutdown::wait(stop)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
