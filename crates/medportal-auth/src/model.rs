//! Auth records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider id of e-mail/password credentials
pub const CREDENTIAL_PROVIDER: &str = "credential";

/// E-mail addresses are compared and stored in this form
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn new(name: &str, email: &str, image: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            email: normalize_email(email),
            image,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(user_id: &str, ttl: chrono::Duration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Credential or OAuth account linked to a user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccount {
    pub id: String,
    pub user_id: String,
    pub provider_id: String,
    pub account_id: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

/// Profile handed over by a social identity provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    pub provider_id: String,
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}
