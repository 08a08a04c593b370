//! Reconciliation service

use crate::SyncError;
use medportal_auth::{AuthResult, AuthStore};
use medportal_common::{ProvisioningApi, UserValidation};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Users checked against the backend
    pub validated: usize,
    /// Stale users removed
    pub deleted: usize,
    /// Stale users whose removal failed
    pub failed: Vec<SyncFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub user_id: String,
    pub reason: String,
}

pub struct UserSyncService {
    store: Arc<dyn AuthStore>,
    backend: Arc<dyn ProvisioningApi>,
}

impl UserSyncService {
    pub fn new(store: Arc<dyn AuthStore>, backend: Arc<dyn ProvisioningApi>) -> Self {
        Self { store, backend }
    }

    /// Validate every local user and remove the ones the backend rejects.
    ///
    /// A failed validation call deletes nothing. A failed deletion is recorded
    /// and the remaining users are still processed.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        tracing::info!("Starting user synchronization");

        let user_ids = self.store.list_user_ids().await.map_err(SyncError::ListUsers)?;
        tracing::info!("Found {} user(s) in auth store", user_ids.len());

        if user_ids.is_empty() {
            return Ok(SyncReport::default());
        }

        let invalid = match self.backend.validate_users(&user_ids).await {
            Ok(UserValidation::AllValid) => Vec::new(),
            Ok(UserValidation::Invalid(ids)) => ids,
            Err(e) => {
                tracing::error!("User validation failed, keeping all users: {}", e);
                return Err(SyncError::Validation(e));
            }
        };

        let mut report = SyncReport {
            validated: user_ids.len(),
            ..SyncReport::default()
        };

        if !invalid.is_empty() {
            tracing::info!("Removing {} stale user(s)", invalid.len());
        }

        for user_id in invalid {
            match self.delete_user(&user_id).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => tracing::debug!("User {} was not in the auth store", user_id),
                Err(e) => {
                    tracing::warn!("Failed to delete user {}: {}", user_id, e);
                    report.failed.push(SyncFailure {
                        user_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Synchronization complete: {} validated, {} deleted, {} failed",
            report.validated,
            report.deleted,
            report.failed.len()
        );
        Ok(report)
    }

    /// Sessions first, then linked accounts, then the user row. True when a
    /// user row was removed.
    async fn delete_user(&self, user_id: &str) -> AuthResult<bool> {
        let sessions = self.store.delete_sessions_for(user_id).await?;
        tracing::debug!("Deleted {} session(s) for user {}", sessions, user_id);

        let accounts = self.store.delete_accounts_for(user_id).await?;
        tracing::debug!("Deleted {} account(s) for user {}", accounts, user_id);

        self.store.delete_user(user_id).await
    }
}
