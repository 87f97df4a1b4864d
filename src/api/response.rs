use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Success envelope: `{status, message, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    code: StatusCode,
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new<S: Into<String>>(code: StatusCode, message: S, data: Option<T>) -> Self {
        Self { code, status: code.as_u16(), message: message.into(), data }
    }

    pub fn ok<S: Into<String>>(message: S, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    pub fn created<S: Into<String>>(message: S, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(self)).into_response()
    }
}
