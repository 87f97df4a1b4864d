//! Authentication and authorization module entry point.
//!
//! Token issuance and verification behind [`TokenService`] with two backends
//! (signed JWT and sealed ChaCha20-Poly1305), the bearer-authentication and
//! admin-gating middleware, and the password login flow.

pub mod claims;
pub mod duration;
pub mod hashing;
pub mod jwt;
pub mod key_manager;
pub mod login_service;
pub mod middleware;
pub mod models;
pub mod sealed;
pub mod token_service;


pub use claims::{Claims, TOKEN_ISSUER};
pub use jwt::JwtTokenService;
pub use key_manager::{KeyManager, SymmetricKey};
pub use login_service::{LoginService, PasswordVerifier};
pub use models::{AuthError, TokenError, TokenPayload};
pub use sealed::{SealedTokenService, SEALED_TOKEN_PREFIX};
pub use token_service::{
    build_token_service, Clock, SharedTokenService, SystemClock, TokenScheme, TokenService,
};
