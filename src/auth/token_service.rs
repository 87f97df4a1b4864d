//! Token service abstraction and backend selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::duration::parse_duration;
use super::jwt::JwtTokenService;
use super::key_manager::KeyManager;
use super::models::{TokenError, TokenPayload};
use super::sealed::SealedTokenService;
use crate::config::TokenConfig;
use crate::domain::User;
use crate::errors::{Error, Result};

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues and verifies access tokens.
///
/// Implementations are immutable after construction and safe to share across
/// request handlers. `verify` must return [`TokenError::ExpiredToken`] only for
/// a token that is otherwise authentic; every other failure is
/// [`TokenError::InvalidToken`].
pub trait TokenService: Send + Sync {
    /// Issue a token for `user` carrying a fresh token id and the user's current role.
    fn issue(&self, user: &User) -> std::result::Result<String, TokenError>;

    /// Check authenticity and expiry, returning the embedded payload.
    fn verify(&self, token: &str) -> std::result::Result<TokenPayload, TokenError>;
}

pub type SharedTokenService = Arc<dyn TokenService>;

/// Lifetimes must be whole seconds and at least one second; `iat` and `exp`
/// carry no sub-second part.
pub(crate) fn validate_lifetime(lifetime: Duration) -> Result<()> {
    if lifetime < Duration::seconds(1) {
        return Err(Error::config("Token lifetime must be at least one second"));
    }
    if lifetime.subsec_nanos() != 0 {
        return Err(Error::config("Token lifetime must be a whole number of seconds"));
    }
    Ok(())
}

/// Token format selected at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScheme {
    /// HMAC-signed JWT; claims are readable by the bearer.
    #[default]
    Jwt,
    /// ChaCha20-Poly1305 sealed claims; opaque to the bearer.
    Sealed,
}

impl TokenScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScheme::Jwt => "jwt",
            TokenScheme::Sealed => "sealed",
        }
    }
}

impl fmt::Display for TokenScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" => Ok(TokenScheme::Jwt),
            "sealed" => Ok(TokenScheme::Sealed),
            other => Err(Error::config(format!(
                "Unknown token scheme '{}': expected 'jwt' or 'sealed'",
                other
            ))),
        }
    }
}

/// Build the configured backend. Any failure here is fatal for startup.
pub fn build_token_service(config: &TokenConfig) -> Result<SharedTokenService> {
    let lifetime = parse_duration(&config.duration)?;

    let service: SharedTokenService = match config.scheme {
        TokenScheme::Jwt => {
            let secret = config.jwt_secret.as_deref().unwrap_or_default();
            Arc::new(JwtTokenService::new(secret.as_bytes(), lifetime)?)
        }
        TokenScheme::Sealed => {
            let key = KeyManager::new(config.symmetric_key.clone(), config.key_file.clone())
                .load_or_create()?;
            Arc::new(SealedTokenService::new(&key, lifetime)?)
        }
    };

    info!(scheme = %config.scheme, lifetime_seconds = lifetime.num_seconds(), "token service ready");
    Ok(service)
}
