use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use turnstile::config::{EvictionMode, TurnstileConfig};
use turnstile::http::{AppState, HttpServer};
use turnstile::ratelimit::{spawn_sweeper, Clock, RateLimiter, SystemClock};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Per-client rate limiting service
#[derive(Debug, Parser)]
#[command(name = "turnstile", version)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides the configuration)
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    info!("Starting Turnstile rate limiting service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = TurnstileConfig::load(args.config.as_deref())?;
    if let Some(addr) = args.http_addr {
        config.server.http_addr = addr;
    }

    let rl = &config.rate_limiting;
    info!(
        http_addr = %config.server.http_addr,
        window_ms = rl.window_ms,
        max_requests = rl.max_requests,
        eviction = ?rl.eviction.mode,
        admin_enabled = config.server.admin_key.is_some(),
        "Configuration loaded"
    );

    let limiter = Arc::new(RateLimiter::from_config(rl));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let sweeper = match rl.eviction.mode {
        EvictionMode::Background => Some(spawn_sweeper(
            limiter.clone(),
            clock.clone(),
            Duration::from_millis(rl.eviction.interval_ms),
        )),
        EvictionMode::Probabilistic | EvictionMode::Interval => None,
    };

    let state = AppState::new(limiter, clock, config.server.admin_key.clone());
    let server = HttpServer::new(config.server.http_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    info!("Turnstile rate limiting service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
