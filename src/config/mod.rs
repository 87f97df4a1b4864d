//! # Configuration Management
//!
//! Environment-driven configuration for the backup API. The binary loads an
//! optional `.env` file with `dotenvy` before calling [`AppConfig::from_env`].

pub mod settings;

pub use settings::{
    AppConfig, DatabaseConfig, EnvSource, LogFormat, ObservabilityConfig, ProcessEnv,
    ServerConfig, TokenConfig,
};
