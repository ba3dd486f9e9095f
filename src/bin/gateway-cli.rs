use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use composition_gateway::config::load_config;
use composition_gateway::registry::client::RegistryClient;
use composition_gateway::registry::store::{RegistryStore, RegistryTtls};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the composition gateway", long_about = None)]
struct Cli {
    /// Registry base URL.
    #[arg(short, long, default_value = "http://localhost:4001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a gateway configuration file
    CheckConfig {
        /// Path to the TOML configuration file
        path: PathBuf,
    },
    /// Fetch and print the resolved configuration for a domain
    Resolve {
        /// Domain to filter the configuration for
        domain: String,
    },
    /// List the domains served by the gateway
    Domains,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => match load_config(&path) {
            Ok(config) => {
                println!("ok: {}", path.display());
                println!("{}", toml::to_string_pretty(&config)?);
            }
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        },
        Commands::Resolve { domain } => {
            let store = store_for(&cli.url)?;
            let config = store.get_config(Some(&domain)).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Domains => {
            let store = store_for(&cli.url)?;
            let domains = store.get_router_domains().await?;
            println!("{}", serde_json::to_string_pretty(domains.as_ref())?);
        }
    }

    Ok(())
}

fn store_for(url: &str) -> Result<RegistryStore, Box<dyn std::error::Error>> {
    let client = Arc::new(RegistryClient::new(url, Duration::from_secs(10))?);
    Ok(RegistryStore::new(client, RegistryTtls::default()))
}
