//! Portal Configuration
//!
//! Settings are layered: an optional config file first, then environment
//! variables prefixed with `MEDPORTAL_` using `__` between nested keys
//! (`MEDPORTAL_SERVER__BIND_ADDR`, `MEDPORTAL_BACKEND__API_KEY`, ...).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Conventional environment variable carrying the provisioning API key
pub const API_KEY_ENV: &str = "API_SERVICE_KEY";
/// Conventional environment variable naming the API key header
pub const API_HEADER_ENV: &str = "API_HEADER_NAME";

/// Portal configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub signup: SignUpConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

impl PortalConfig {
    /// Load configuration from `path` (optional) overlaid with the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDPORTAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: PortalConfig = settings.try_deserialize()?;
        Ok(config)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Externally visible base URL, used for payment return URLs
    pub public_url: String,
    /// Enables `Secure` cookies
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            public_url: "http://localhost:3000".to_string(),
            production: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    #[serde(skip_serializing)]
    pub secret: String,
    /// Cookie carrying the auth provider session token
    pub auth_cookie_name: String,
    /// Lifetime of an auth provider session
    pub ttl_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "signup-session".to_string(),
            secret: String::new(),
            auth_cookie_name: "medportal.session_token".to_string(),
            ttl_days: 7,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.ttl_days.max(1))
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &"<redacted>")
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("ttl_days", &self.ttl_days)
            .finish()
    }
}

/// Provisioning backend settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_header_name: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            api_header_name: None,
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    /// API key settings, falling back to `API_SERVICE_KEY` / `API_HEADER_NAME`
    pub fn api_keys(&self) -> ApiKeyConfig {
        let env = ApiKeyConfig::from_env();
        ApiKeyConfig::new(
            self.api_key.clone().or(env.api_key),
            self.api_header_name.clone().or(env.header_name),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_header_name", &self.api_header_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Local image storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_path: String,
    pub public_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: "./uploads".to_string(),
            public_url: "/uploads".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SignUpConfig {
    /// Upper bound for each external call made while signing up
    pub call_timeout_secs: u64,
    /// How long a provisioned user id is remembered against replayed
    /// payment confirmations
    pub provisioned_retention_secs: u64,
}

impl Default for SignUpConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 15,
            provisioned_retention_secs: 24 * 60 * 60,
        }
    }
}

impl SignUpConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn provisioned_retention(&self) -> Duration {
        Duration::from_secs(self.provisioned_retention_secs)
    }
}

/// Social sign-on: id tokens are HS256-signed with `id_token_secret` and
/// must be issued by one of `providers`. An empty secret disables the route.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    #[serde(skip_serializing)]
    pub id_token_secret: String,
    pub providers: Vec<String>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            id_token_secret: String::new(),
            providers: vec!["google".to_string()],
        }
    }
}

impl fmt::Debug for SocialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialConfig")
            .field("id_token_secret", &"<redacted>")
            .field("providers", &self.providers)
            .finish()
    }
}

/// API key and header name for the provisioning backend.
///
/// Both values are resolved at the call site; an absent or empty value is a
/// configuration error.
#[derive(Clone, Default)]
pub struct ApiKeyConfig {
    api_key: Option<String>,
    header_name: Option<String>,
}

impl ApiKeyConfig {
    pub fn new(api_key: Option<String>, header_name: Option<String>) -> Self {
        Self { api_key, header_name }
    }

    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            header_name: std::env::var(API_HEADER_ENV).ok(),
        }
    }

    pub fn key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::ApiKeyNotSet)
    }

    pub fn header_name(&self) -> Result<&str, ConfigError> {
        self.header_name
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::ApiKeyHeaderNotSet)
    }
}

impl fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("header_name", &self.header_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PortalConfig::load("/nonexistent/medportal-config").unwrap();
        assert_eq!(config.session.cookie_name, "signup-session");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.signup.call_timeout(), Duration::from_secs(15));
        assert_eq!(config.signup.provisioned_retention(), Duration::from_secs(86_400));
        assert_eq!(config.session.ttl(), chrono::Duration::days(7));
        assert!(config.social.id_token_secret.is_empty());
        assert_eq!(config.social.providers, ["google"]);
    }

    #[test]
    fn test_api_key_absent_is_config_error() {
        let keys = ApiKeyConfig::new(None, Some("X-API-KEY".into()));
        assert!(matches!(keys.key(), Err(ConfigError::ApiKeyNotSet)));
        assert_eq!(keys.header_name().unwrap(), "X-API-KEY");

        let keys = ApiKeyConfig::new(Some("secret".into()), Some(String::new()));
        assert!(matches!(keys.header_name(), Err(ConfigError::ApiKeyHeaderNotSet)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let keys = ApiKeyConfig::new(Some("super-secret".into()), None);
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains("super-secret"));

        let session = SessionConfig {
            secret: "another-secret".into(),
            ..SessionConfig::default()
        };
        assert!(!format!("{:?}", session).contains("another-secret"));

        let social = SocialConfig {
            id_token_secret: "provider-secret".into(),
            ..SocialConfig::default()
        };
        assert!(!format!("{:?}", social).contains("provider-secret"));
    }
}
