use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{init_database, run, AppState};
use shared::config::load_config;

#[derive(Debug, Parser)]
#[command(name = "server", about = "Account and session-lifecycle backend")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config/server.toml")]
    config: String,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let pool = init_database(&config).await?;

    let addr = config.server.addr();
    let state = AppState::new(config, pool)?;

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    run(listener, state).await
}
