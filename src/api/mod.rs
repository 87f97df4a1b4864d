//! HTTP surface: routes, handlers, and the error/response envelopes.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use response::ApiResponse;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
