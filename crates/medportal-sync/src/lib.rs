//! User Synchronization
//!
//! Removes local auth users the system of record no longer knows, so stale
//! session cookies stop granting access. Runs once per process through
//! [`SyncGate`].

use medportal_auth::AuthError;
use medportal_common::BackendError;
use thiserror::Error;

pub mod gate;
pub mod service;

#[cfg(test)]
mod testing;

pub use gate::SyncGate;
pub use service::{SyncFailure, SyncReport, UserSyncService};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch users: {0}")]
    ListUsers(#[source] AuthError),

    #[error("Validation request failed: {0}")]
    Validation(#[source] BackendError),
}
