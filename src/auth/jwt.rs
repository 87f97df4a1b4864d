//! Signed token backend built on `jsonwebtoken`.
//!
//! Tokens are HS256 JWTs over the canonical [`Claims`]. Integrity only: the
//! claims are readable by anyone holding the token.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use super::claims::{Claims, TOKEN_ISSUER};
use super::models::{TokenError, TokenPayload};
use super::token_service::{validate_lifetime, Clock, SystemClock, TokenService};
use crate::domain::User;
use crate::errors::{Error, Result};

/// Algorithms accepted on verify. Anything else is rejected before the
/// signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Create a signed backend. An empty secret or non-positive lifetime is a
    /// configuration error.
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::config("TOKEN_JWT_SECRET must be set for the jwt token scheme"));
        }
        validate_lifetime(lifetime)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("secret", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> std::result::Result<String, TokenError> {
        let payload = TokenPayload::new(user.id.clone(), user.role);
        let claims = Claims::new(payload, self.clock.now(), self.lifetime)?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::TokenCreation(err.to_string()))
    }

    fn verify(&self, token: &str) -> std::result::Result<TokenPayload, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::InvalidToken)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            debug!(algorithm = ?header.alg, "rejected token signed with unexpected algorithm");
            return Err(TokenError::InvalidToken);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                _ => TokenError::InvalidToken,
            })?
            .claims;

        if !claims.is_consistent() {
            return Err(TokenError::InvalidToken);
        }

        let now = self.clock.now();
        if claims.is_premature_at(now) {
            return Err(TokenError::InvalidToken);
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::ExpiredToken);
        }

        Ok(claims.payload)
    }
}
