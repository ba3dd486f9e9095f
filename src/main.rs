//! Composition gateway server binary.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use composition_gateway::config::{load_config, GatewayConfig};
use composition_gateway::http::GatewayServer;
use composition_gateway::observability;

#[derive(Parser)]
#[command(name = "composition-gateway", about = "Multi-tenant page composition gateway")]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    observability::logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        registry_url = %config.registry.url,
        engine_url = %config.engine.url,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    // Guard hooks are supplied by the embedding application; the
    // standalone binary runs with an empty chain.
    let server = GatewayServer::new(config, Vec::new())?;
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
