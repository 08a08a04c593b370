//! Patient Portal Common
//!
//! Shared building blocks for the portal crates:
//! - Layered configuration (`config` file + `MEDPORTAL_*` environment)
//! - API-key configuration for the provisioning backend
//! - The `{data, error}` outcome shape used at I/O boundaries
//! - The provisioning API client (user provisioning and batch validation)

pub mod backend;
pub mod config;
pub mod error;
pub mod outcome;

pub use backend::{
    HttpProvisioningClient, ProvisionUserRequest, ProvisioningApi, UserValidation,
};
pub use config::{ApiKeyConfig, PortalConfig};
pub use error::{BackendError, ConfigError};
pub use outcome::{attempt, Outcome};
