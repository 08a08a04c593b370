//! Once-per-process sync trigger

use crate::service::{SyncReport, UserSyncService};
use medportal_common::{attempt, Outcome};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Runs the reconciliation at most once. Concurrent callers wait for the
/// first run and all observe its result.
pub struct SyncGate {
    service: Arc<UserSyncService>,
    outcome: OnceCell<Outcome<SyncReport, String>>,
}

impl SyncGate {
    pub fn new(service: Arc<UserSyncService>) -> Self {
        Self {
            service,
            outcome: OnceCell::new(),
        }
    }

    pub async fn run_once(&self) -> Outcome<SyncReport, String> {
        self.outcome
            .get_or_init(|| async {
                let outcome = attempt(self.service.sync()).await;
                if let Some(error) = outcome.error() {
                    tracing::error!("User synchronization failed: {}", error);
                }
                outcome
            })
            .await
            .clone()
    }
}
