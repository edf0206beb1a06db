//! Structured logging setup using tracing.

use crate::config::LoggingConfig;
use crate::domain::errors::ClinopsError;
use crate::domain::result::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the configured level is
/// applied to this crate's events.
///
/// # Errors
///
/// Returns a configuration error if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clinops={}", config.level)));

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| ClinopsError::Configuration(format!("Failed to initialize logging: {e}")))
}
