//! # Observability Infrastructure
//!
//! Structured logging through `tracing`. HTTP request spans come from
//! `tower_http::trace::TraceLayer` in [`crate::api::routes`].

pub mod logging;

pub use logging::{init_logging, log_config_info};
