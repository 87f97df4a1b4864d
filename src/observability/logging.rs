//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. The filter comes from
//! [`ObservabilityConfig::log_level`] and accepts any `EnvFilter` directive,
//! so `info` and `backup_api=debug,tower_http=info` both work.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AppConfig, LogFormat, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for database operations.
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|err| Error::config(format!("Invalid log level '{}': {}", config.log_level, err)))
}

/// Install the global subscriber. Fails if the filter is invalid or a
/// subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    installed.map_err(|err| Error::config(format!("Failed to initialize logging: {}", err)))
}

/// Log configuration at startup. Secrets are never included.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_max_connections = config.database.max_connections,
        auto_migrate = config.database.auto_migrate,
        token_scheme = %config.token.scheme,
        token_duration = %config.token.duration,
        log_format = ?config.observability.log_format,
        "backup API configuration"
    );
}
