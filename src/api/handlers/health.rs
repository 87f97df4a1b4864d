//! Health check endpoint for monitoring and readiness probes

use serde::Serialize;

use crate::api::response::ApiResponse;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Unauthenticated liveness probe.
pub async fn health_handler() -> ApiResponse<HealthResponse> {
    ApiResponse::ok("ok", HealthResponse { status: "healthy" })
}
