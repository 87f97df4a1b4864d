//! Canonical claim set carried by every access token.
//!
//! Both backends encode the same shape: the payload fields flattened next to
//! the registered timing claims. The signed backend exposes it to anyone who
//! base64-decodes the token, so nothing beyond id and role may be added here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::models::{TokenError, TokenPayload};

/// Value of the `iss` claim on issued tokens.
pub const TOKEN_ISSUER: &str = "backup-api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: TokenPayload,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    pub iss: String,
    pub sub: String,
    pub jti: String,
}

impl Claims {
    /// Stamp `payload` with `iat = nbf = issued_at` and `exp = issued_at + lifetime`.
    pub fn new(
        payload: TokenPayload,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .ok_or_else(|| TokenError::TokenCreation("token expiry out of range".to_string()))?;

        Ok(Self {
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            sub: payload.user_id.to_string(),
            jti: payload.id.to_string(),
            payload,
        })
    }

    /// True once `now` is past `exp`, counting the sub-second part of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        (now.timestamp(), now.timestamp_subsec_nanos()) > (self.exp, 0)
    }

    pub fn is_premature_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.nbf
    }

    /// Registered claims must agree with the payload they wrap.
    pub fn is_consistent(&self) -> bool {
        self.iss == TOKEN_ISSUER
            && self.jti == self.payload.id.as_str()
            && self.sub == self.payload.user_id.as_str()
    }
}
