//! Provisioning API Client
//!
//! HTTP client for the system-of-record backend: provisions patients once
//! their payment has been captured and batch-validates auth user ids.

use crate::config::ApiKeyConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVISION_PATH: &str = "/api/v1/user-provisions";
pub const VALIDATE_PATH: &str = "/api/v1/user-provisions/validate";

/// Payload sent to the provisioning endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionUserRequest {
    pub user_id: String,
    pub email: String,
    pub specialist_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Result of a batch validation call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserValidation {
    /// Every id is known to the backend
    AllValid,
    /// The backend rejected these ids
    Invalid(Vec<String>),
}

impl UserValidation {
    pub fn invalid_ids(&self) -> &[String] {
        match self {
            UserValidation::AllValid => &[],
            UserValidation::Invalid(ids) => ids,
        }
    }
}

/// Provisioning backend operations
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// Provision a paid user. Succeeds only on `201 Created`.
    async fn provision_user(&self, request: &ProvisionUserRequest) -> Result<(), BackendError>;

    /// Validate auth user ids against the system of record
    async fn validate_users(&self, ids: &[String]) -> Result<UserValidation, BackendError>;
}

/// Problem detail body returned on non-success statuses
#[derive(Debug, Default, Deserialize)]
struct ProblemDetail {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    invalid_ids: Option<Vec<String>>,
}

impl ProblemDetail {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn detail_text(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    ids: &'a [String],
}

/// reqwest-backed [`ProvisioningApi`]
pub struct HttpProvisioningClient {
    client: reqwest::Client,
    base_url: String,
    api_keys: ApiKeyConfig,
}

impl HttpProvisioningClient {
    /// Create new provisioning client
    pub fn new(
        base_url: &str,
        api_keys: ApiKeyConfig,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_keys,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(StatusCode, String), BackendError> {
        let key = self.api_keys.key()?;
        let header = self.api_keys.header_name()?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header(header, key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Ok((status, text))
    }
}

#[async_trait]
impl ProvisioningApi for HttpProvisioningClient {
    async fn provision_user(&self, request: &ProvisionUserRequest) -> Result<(), BackendError> {
        let (status, body) = self.post(PROVISION_PATH, request).await?;

        if status == StatusCode::CREATED {
            tracing::info!("Provisioned user {}", request.user_id);
            return Ok(());
        }

        let problem = ProblemDetail::parse(&body);
        let err = match status {
            StatusCode::BAD_REQUEST => BackendError::InvalidRequest(match &problem.detail {
                Some(detail) if !detail.is_null() => format!("Invalid request: {}", detail),
                _ => "Invalid request".to_string(),
            }),
            StatusCode::UNAUTHORIZED => {
                BackendError::Unauthorized(problem.detail_text().unwrap_or_else(|| "Unauthorized".into()))
            }
            StatusCode::FORBIDDEN => {
                BackendError::Forbidden(problem.detail_text().unwrap_or_else(|| "Forbidden".into()))
            }
            other => BackendError::Unexpected {
                status: other.as_u16(),
                body,
            },
        };

        tracing::warn!("Provisioning of user {} rejected: {}", request.user_id, err);
        Err(err)
    }

    async fn validate_users(&self, ids: &[String]) -> Result<UserValidation, BackendError> {
        let (status, body) = self.post(VALIDATE_PATH, &ValidateBody { ids }).await?;

        match status {
            s if s.is_success() => Ok(UserValidation::AllValid),
            StatusCode::BAD_REQUEST => {
                let invalid = ProblemDetail::parse(&body).invalid_ids.unwrap_or_default();
                tracing::debug!("Backend rejected {} of {} user id(s)", invalid.len(), ids.len());
                Ok(UserValidation::Invalid(invalid))
            }
            other => Err(BackendError::Unexpected {
                status: other.as_u16(),
                body,
            }),
        }
    }
}
