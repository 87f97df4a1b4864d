//! Axum middleware for authentication and authorization.
//!
//! `authenticate` verifies the bearer token and stores the resulting
//! [`TokenPayload`] in the request extensions; `require_admin` runs after it
//! and reads the payload back. Any rejection short-circuits the chain.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{field, instrument, warn, Span};

use super::models::{AuthError, TokenPayload};
use super::token_service::SharedTokenService;
use crate::api::error::ApiError;

const BEARER_SCHEME: &str = "bearer";

/// Raw `Authorization` header value, if present.
fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::InvalidAuthorizationHeader))
        .transpose()
}

/// Extract the token from `Bearer <token>`. The scheme is matched
/// case-insensitively and the value must split into exactly two fields.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.unwrap_or_default();
    if value.is_empty() {
        return Err(AuthError::EmptyAuthorizationHeader);
    }

    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => Ok(token),
        _ => Err(AuthError::InvalidAuthorizationHeader),
    }
}

/// Admin gate over the payload left by [`authenticate`].
pub fn authorize_admin(payload: Option<&TokenPayload>) -> Result<(), AuthError> {
    match payload {
        None => Err(AuthError::InvalidAuthorizationPayload),
        Some(payload) if payload.is_admin() => Ok(()),
        Some(_) => Err(AuthError::Forbidden),
    }
}

/// Middleware entry point that authenticates requests with the configured token service.
#[instrument(
    name = "auth_middleware.authenticate",
    skip_all,
    fields(
        http.method = %request.method(),
        http.path = %request.uri().path(),
        correlation_id = %uuid::Uuid::new_v4(),
        auth.token_id = field::Empty,
        user_id = field::Empty,
    )
)]
pub async fn authenticate(
    State(tokens): State<SharedTokenService>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = authorization_header(request.headers())
        .and_then(bearer_token)
        .and_then(|token| tokens.verify(token).map_err(AuthError::from));

    match verified {
        Ok(payload) => {
            let span = Span::current();
            span.record("auth.token_id", field::display(&payload.id));
            span.record("user_id", field::display(&payload.user_id));
            request.extensions_mut().insert(payload);
            Ok(next.run(request).await)
        }
        Err(err) => {
            warn!(reason = %err, code = err.code(), "authentication failed");
            Err(err.into())
        }
    }
}

/// Middleware entry point that only lets admin tokens through.
#[instrument(
    name = "auth_middleware.require_admin",
    skip_all,
    fields(http.method = %request.method(), http.path = %request.uri().path())
)]
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let payload = request.extensions().get::<TokenPayload>();
    if let Err(err) = authorize_admin(payload) {
        warn!(
            user_id = payload.map(|p| p.user_id.as_str()).unwrap_or_default(),
            role = payload.map(|p| p.role.as_str()).unwrap_or_default(),
            code = err.code(),
            "authorization failed"
        );
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
