//! Patient Sign-Up Flow
//!
//! Drives a new patient through account creation, profile data and payment,
//! resumable across requests through an encrypted session cookie.
//!
//! ## States
//! ```text
//! email ─┐
//!        ├─► user-data ─► payment-info ─► success ─► profile-update
//! social-sign-on ┘
//! ```
//!
//! Provisioning against the system of record happens only after payment and
//! never more than once per user. A failure at that point keeps the session
//! so the captured payment can be retried.

use medportal_auth::AuthError;
use medportal_common::{BackendError, ConfigError};
use thiserror::Error;

pub mod cookie;
pub mod flow;
pub mod forms;
pub mod redirect;
pub mod session;
pub mod social;
pub mod storage;
pub mod store;
pub mod validate;

#[cfg(test)]
mod testing;

pub use cookie::{SessionSealer, MIN_SECRET_LEN};
pub use flow::{guard_payment_info_page, guard_user_data_page, PageGuard, SignUpFlow};
pub use redirect::{Notice, Redirect, Route};
pub use session::{
    AccountData, AccountSubmission, Address, ProfileImage, SignUpInput, SignUpSession, SignUpState,
    UserData,
};
pub use social::{NewUserCheck, SocialUser};
pub use storage::{ImageStorage, LocalImageStorage};
pub use store::{read_cookie, CookieSessionStore, MemorySessionStore, SessionStore};
pub use validate::FieldIssue;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session secret must be at least {min} bytes")]
    SecretTooShort { min: usize },

    #[error("session cookie could not be decoded")]
    Malformed,

    #[error("session cookie failed authentication")]
    Tampered,

    #[error("session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session encryption failed")]
    Crypto,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to delete file {path}: {source}")]
    Delete {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

#[derive(Error, Debug)]
pub enum SignUpError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("image storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to create account: {0}")]
    AccountCreation(#[from] AuthError),

    /// Payment was captured but the backend did not provision the user. The
    /// session is kept so the step can be retried.
    #[error("Account created but setup incomplete. Contact support.")]
    ProvisioningFailed { user_id: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl SignUpError {
    /// Navigation that recovers from this error, if any
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            SignUpError::ProvisioningFailed { .. } => {
                Some(Redirect::to(Route::PaymentInfo).with_notice(Notice::ProvisioningFailed))
            }
            _ => None,
        }
    }

    /// Landing page for a browser returning from checkout after this error
    pub fn checkout_redirect(&self) -> Redirect {
        self.redirect()
            .unwrap_or_else(|| Redirect::to(Route::PaymentInfo).with_notice(Notice::UnknownError))
    }

    pub(crate) fn provisioning(user_id: &str, err: BackendError) -> Self {
        match err {
            BackendError::Config(config) => SignUpError::Config(config),
            other => SignUpError::ProvisioningFailed {
                user_id: user_id.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SignUpError>;
