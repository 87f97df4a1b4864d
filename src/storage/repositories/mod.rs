//! # Repository Layer
//!
//! Database-backed repositories built on `sqlx`.

pub mod user;

pub use user::{SqlxUserRepository, UserRepository};
