//! Data models shared by the token backends and the authentication middleware.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{TokenId, UserId, UserRole};

/// Verified identity extracted from an access token.
///
/// Constructed by [`TokenService::issue`](super::token_service::TokenService::issue)
/// and recovered by `verify`; it lives only for the duration of a request and is
/// never persisted. `role` is the role the user held when the token was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "token_id")]
    pub id: TokenId,
    pub user_id: UserId,
    pub role: UserRole,
}

impl TokenPayload {
    /// Build a payload with a freshly generated token id.
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { id: TokenId::new(), user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Failures produced by a [`TokenService`](super::token_service::TokenService).
///
/// `InvalidToken` never says which check failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("failed to create token: {0}")]
    TokenCreation(String),
}

/// Errors returned by the authentication and authorization middleware.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is not provided")]
    EmptyAuthorizationHeader,
    #[error("authorization header format is invalid")]
    InvalidAuthorizationHeader,
    #[error("unauthorized: {0}")]
    Unauthorized(#[source] TokenError),
    #[error("authorization payload is missing")]
    InvalidAuthorizationPayload,
    #[error("forbidden: admin role required")]
    Forbidden,
}

impl AuthError {
    /// Stable machine-readable code returned in the `error` field of the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmptyAuthorizationHeader => "ERR_EMPTY_AUTH_HEADER",
            AuthError::InvalidAuthorizationHeader => "ERR_INVALID_AUTH_HEADER",
            AuthError::Unauthorized(_) => "ERR_UNAUTHORIZED",
            AuthError::InvalidAuthorizationPayload => "ERR_INVALID_AUTH_PAYLOAD",
            AuthError::Forbidden => "ERR_FORBIDDEN",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Unauthorized(err)
    }
}
