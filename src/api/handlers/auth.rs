use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginBody {
    #[validate(length(min = 1, max = 64, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// `POST /login`: exchange credentials for an access token.
pub async fn login_handler(
    State(state): State<ApiState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(body) = body.map_err(|err| ApiError::bad_request(err.body_text()))?;
    body.validate().map_err(|err| ApiError::from(crate::errors::Error::from(err)))?;

    let access_token = state.login.login(&body.username, &body.password).await?;
    Ok(ApiResponse::ok("login successful", LoginResponse { access_token }))
}
