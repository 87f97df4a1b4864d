//! # Storage and Persistence
//!
//! Postgres connectivity and the user repository consulted by the login flow.

pub mod pool;
pub mod repositories;

pub use pool::{check_connection, create_pool, run_migrations, DbPool};
pub use repositories::{SqlxUserRepository, UserRepository};
