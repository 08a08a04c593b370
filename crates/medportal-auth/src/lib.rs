//! Local Auth Provider
//!
//! Users, sessions and linked accounts for the portal, with HS256 session
//! tokens, argon2 credentials and verified provider id tokens. The store enforces referential integrity: a user row can only be
//! removed once its sessions and linked accounts are gone.

use thiserror::Error;

pub mod model;
pub mod password;
pub mod provider;
pub mod store;
pub mod token;

pub use model::{AuthSession, AuthUser, LinkedAccount, SocialProfile, CREDENTIAL_PROVIDER};
pub use provider::{AuthProvider, LocalAuthProvider};
pub use store::{AuthStore, InMemoryAuthStore};
pub use token::{IdTokenClaims, IdTokenVerifier, SessionClaims, TokenSigner};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid e-mail or password")]
    InvalidCredentials,

    #[error("identity assertion rejected: {0}")]
    InvalidIdentity(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("auth store unavailable: {0}")]
    Unavailable(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
