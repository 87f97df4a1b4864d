//! Encrypted token backend.
//!
//! Claims are serialized to JSON and sealed with ChaCha20-Poly1305 under a
//! random nonce. Wire format: `v1.local.` followed by base64url (no padding)
//! of `nonce || ciphertext || tag`.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

use super::claims::Claims;
use super::key_manager::SymmetricKey;
use super::models::{TokenError, TokenPayload};
use super::token_service::{validate_lifetime, Clock, SystemClock, TokenService};
use crate::domain::User;
use crate::errors::{Error, Result};

pub const SEALED_TOKEN_PREFIX: &str = "v1.local.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenError {
    Malformed,
    Authentication,
    Deserialize,
}

impl OpenError {
    fn as_str(&self) -> &'static str {
        match self {
            OpenError::Malformed => "malformed",
            OpenError::Authentication => "authentication",
            OpenError::Deserialize => "deserialize",
        }
    }
}

pub struct SealedTokenService {
    key: LessSafeKey,
    rng: SystemRandom,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl SealedTokenService {
    pub fn new(key: &SymmetricKey, lifetime: Duration) -> Result<Self> {
        validate_lifetime(lifetime)?;
        let unbound = UnboundKey::new(&CHACHA20_POLY1305, key.as_bytes())
            .map_err(|_| Error::config("Token key has the wrong length"))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
            lifetime,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn seal(&self, claims: &Claims) -> std::result::Result<String, TokenError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| TokenError::TokenCreation("failed to generate nonce".to_string()))?;

        let mut in_out = serde_json::to_vec(claims)
            .map_err(|err| TokenError::TokenCreation(err.to_string()))?;
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| TokenError::TokenCreation("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);

        Ok(format!("{}{}", SEALED_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(sealed)))
    }

    fn open(&self, token: &str) -> std::result::Result<Claims, OpenError> {
        let body = token.strip_prefix(SEALED_TOKEN_PREFIX).ok_or(OpenError::Malformed)?;
        let mut sealed = URL_SAFE_NO_PAD.decode(body).map_err(|_| OpenError::Malformed)?;
        if sealed.len() < NONCE_LEN + CHACHA20_POLY1305.tag_len() {
            return Err(OpenError::Malformed);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at_mut(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| OpenError::Malformed)?;
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), ciphertext)
            .map_err(|_| OpenError::Authentication)?;

        serde_json::from_slice(plaintext).map_err(|_| OpenError::Deserialize)
    }
}

impl fmt::Debug for SealedTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedTokenService")
            .field("key", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenService for SealedTokenService {
    fn issue(&self, user: &User) -> std::result::Result<String, TokenError> {
        let payload = TokenPayload::new(user.id.clone(), user.role);
        let claims = Claims::new(payload, self.clock.now(), self.lifetime)?;
        self.seal(&claims)
    }

    fn verify(&self, token: &str) -> std::result::Result<TokenPayload, TokenError> {
        let claims = self.open(token).map_err(|reason| {
            debug!(reason = reason.as_str(), "sealed token rejected");
            TokenError::InvalidToken
        })?;

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
