/*
feedfinder - main.rs
Loads configuration, builds the long-lived service handles and serves the HTTP API.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use feedfinder::finder::FeedFinder;
use feedfinder::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "feedfinder", about = "Find live RSS/Atom feeds for a topic")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the listening port (takes precedence over PORT and config)
    #[arg(long)]
    port: Option<u16>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenv::dotenv();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let loaded = Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await;
    let mut config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    config.apply_env()?;
    if let Some(port) = args.port {
        config.server.port = Some(port);
    }
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let finder = match FeedFinder::from_config(&config) {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("failed to initialize feed finder: {:#}", e);
            return Err(e);
        }
    };

    launch_rocket(&config, finder).await
}
