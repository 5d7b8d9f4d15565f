//! authgate — authentication gateway with rate limiting and audit logging.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authgate::auth::MemoryDirectory;
use authgate::config::{load_config, GatewayConfig};
use authgate::http::HttpServer;
use authgate::lifecycle::Shutdown;
use authgate::observability::event_log::EventLog;
use authgate::observability::metrics;

#[derive(Parser, Debug)]
#[command(
    name = "authgate",
    version,
    about = "Authentication gateway with rate limiting and audit logging"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window_ms,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Composition root: the single effective EventLog instance, the
    // credential collaborator, and the server that owns the limiter.
    let log = Arc::new(EventLog::new(config.logging.resolve()));
    let directory = Arc::new(MemoryDirectory::new());
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config, log, directory);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
