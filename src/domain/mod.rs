//! Domain layer
//!
//! Plain domain entities with no HTTP or database dependencies.

pub mod id;
pub mod user;

pub use id::{TokenId, UserId};
pub use user::{NewUser, UpdateUser, User, UserRole, UserRoleParseError};
