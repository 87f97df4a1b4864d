use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;

use crate::auth::models::{AuthError, TokenError};
use crate::errors::Error;

pub const ERR_BAD_REQUEST: &str = "ERR_BAD_REQUEST";
pub const ERR_DATA_NOT_FOUND: &str = "ERR_DATA_NOT_FOUND";
pub const ERR_CONFLICTING_DATA: &str = "ERR_CONFLICTING_DATA";
pub const ERR_INVALID_CREDENTIALS: &str = "ERR_INVALID_CREDENTIALS";
pub const ERR_TOKEN_CREATION: &str = "ERR_TOKEN_CREATION_ERROR";
pub const ERR_INTERNAL: &str = "ERR_INTERNAL_ERROR";

/// Error returned from handlers and middleware.
///
/// Client-facing variants carry a detail message; auth and internal variants
/// carry only the machine code so nothing about the failed check leaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    Internal(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => ERR_BAD_REQUEST,
            ApiError::NotFound(_) => ERR_DATA_NOT_FOUND,
            ApiError::Conflict(_) => ERR_CONFLICTING_DATA,
            ApiError::Unauthorized(code) | ApiError::Forbidden(code) | ApiError::Internal(code) => {
                *code
            }
        }
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ApiError::NotFound(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error = self.code();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(_) => "authentication failed".to_string(),
            ApiError::Forbidden(_) => "insufficient role".to_string(),
            ApiError::Internal(_) => "unexpected error".to_string(),
        };

        (status, Json(ErrorBody { status: status.as_u16(), message, error })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => ApiError::Forbidden(err.code()),
            _ => ApiError::Unauthorized(err.code()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Auth { .. } => ApiError::Unauthorized(ERR_INVALID_CREDENTIALS),
            Error::Token(TokenError::TokenCreation(reason)) => {
                error!(%reason, "token creation failed");
                ApiError::Internal(ERR_TOKEN_CREATION)
            }
            Error::Token(token_err) => ApiError::from(AuthError::from(token_err)),
            other => {
                error!(error = %other, "request failed");
                ApiError::Internal(ERR_INTERNAL)
            }
        }
    }
}
