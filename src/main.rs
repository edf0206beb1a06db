use clap::Parser;
use clinops::adapters::directory::HttpDirectoryClient;
use clinops::config::loader::{config_from_env, load_config};
use clinops::http::{create_router, AppState};
use clinops::logging::init_logging;
use std::process;
use std::sync::Arc;

/// Clinical operations service: scheduling, billing and pharmacy.
#[derive(Debug, Parser)]
#[command(name = "clinops", version, about)]
struct Cli {
    /// Path to the configuration file. Without it, defaults plus
    /// CLINOPS_* environment overrides are used.
    #[arg(short, long, env = "CLINOPS_CONFIG")]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Bind address override, e.g. 127.0.0.1:9090.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => config_from_env()?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    config
        .validate()
        .map_err(clinops::domain::errors::ClinopsError::Configuration)?;

    init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind,
        directory = %config.directory.base_url,
        "Starting clinops"
    );

    let directory = HttpDirectoryClient::new(
        config.directory.base_url.clone(),
        config.directory.timeout(),
    )?;
    let app = create_router(AppState::new(Arc::new(directory)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        } else {
            tracing::info!("Received SIGINT, shutting down");
        }
    }
}
