//! # Backup API
//!
//! Metadata management API for backup plans, devices and customers. This crate
//! carries its authentication core: pluggable access tokens (signed JWT or
//! sealed ChaCha20-Poly1305), bearer-token middleware, admin role gating, and
//! the password login flow that issues tokens.
//!
//! ## Architecture
//!
//! ```text
//! axum router → authenticate → require_admin → handlers
//!                    ↓                              ↓
//!              TokenService                  UserRepository (Postgres)
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
