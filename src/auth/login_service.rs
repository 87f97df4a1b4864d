//! Username/password login.

use std::sync::{Arc, LazyLock};

use tracing::{info, instrument, warn};

use super::hashing::{self, Argon2PasswordVerifier};
use super::token_service::SharedTokenService;
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::repositories::UserRepository;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Verified against when the username is unknown so both failure paths cost one hash check.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

/// Checks a plaintext password against a stored hash.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct LoginService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordVerifier>,
    tokens: SharedTokenService,
}

impl LoginService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordVerifier>,
        tokens: SharedTokenService,
    ) -> Self {
        Self { users, passwords, tokens }
    }

    /// Argon2 verification with the given repository and token service.
    pub fn with_argon2(users: Arc<dyn UserRepository>, tokens: SharedTokenService) -> Self {
        Self::new(users, Arc::new(Argon2PasswordVerifier), tokens)
    }

    fn password_matches(&self, password: &str, stored_hash: &str) -> bool {
        match self.passwords.verify(password, stored_hash) {
            Ok(matches) => matches,
            Err(err) => {
                warn!(error = %err, "stored password hash could not be checked");
                false
            }
        }
    }

    /// Authenticate `username`/`password` and issue an access token.
    ///
    /// Unknown users and wrong passwords fail identically with
    /// [`AuthErrorType::InvalidCredentials`].
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let Some((user, password_hash)) = self.users.get_user_with_password(username).await? else {
            let _ = self.password_matches(password, &DUMMY_HASH);
            warn!("login attempt for unknown user");
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        };

        if !self.password_matches(password, &password_hash) {
            warn!(user_id = %user.id, "login attempt with incorrect password");
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        }

        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(token)
    }
}
