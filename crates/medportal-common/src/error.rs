//! Error types shared by the portal crates

use thiserror::Error;

/// Configuration errors. Always fatal; callers must not retry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The provisioning API key is not configured
    #[error("API key is not set")]
    ApiKeyNotSet,

    /// The header carrying the provisioning API key is not configured
    #[error("API key header name is not set")]
    ApiKeyHeaderNotSet,

    /// Configuration sources could not be read or deserialized
    #[error("config error: {0}")]
    Load(#[from] config::ConfigError),

    /// A configured value is present but unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned by the provisioning backend client
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 400 from the backend
    #[error("{0}")]
    InvalidRequest(String),

    /// 401 from the backend
    #[error("{0}")]
    Unauthorized(String),

    /// 403 from the backend
    #[error("{0}")]
    Forbidden(String),

    #[error("unexpected response {status}: {body}")]
    Unexpected { status: u16, body: String },
}

impl BackendError {
    /// Configuration problems are never worth retrying
    pub fn is_config(&self) -> bool {
        matches!(self, BackendError::Config(_))
    }
}
