use async_trait::async_trait;
use medportal_common::{BackendError, ProvisionUserRequest, ProvisioningApi, UserValidation};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers one validation call with a canned result, then reports all valid
pub(crate) struct StubBackend {
    pub result: Mutex<Option<Result<UserValidation, BackendError>>>,
    pub calls: AtomicUsize,
}

impl StubBackend {
    pub fn returning(result: Result<UserValidation, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ProvisioningApi for StubBackend {
    async fn provision_user(&self, _request: &ProvisionUserRequest) -> Result<(), BackendError> {
        Ok(())
    }

    async fn validate_users(&self, _ids: &[String]) -> Result<UserValidation, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .take()
            .unwrap_or(Ok(UserValidation::AllValid))
    }
}
