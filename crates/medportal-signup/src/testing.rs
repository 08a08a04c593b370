//! Test doubles shared by the flow tests

use crate::flow::SignUpFlow;
use crate::session::{AccountSubmission, Address, SignUpInput, SignUpState, UserData};
use crate::storage::LocalImageStorage;
use async_trait::async_trait;
use medportal_auth::{AuthStore, InMemoryAuthStore, LocalAuthProvider};
use medportal_common::{BackendError, ProvisionUserRequest, ProvisioningApi, UserValidation};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &[u8] = b"flow-test-secret-0123456789abcdef";
pub const SPECIALIST: &str = "0b9b3c8e-3f5e-4c1a-9d7e-2a1f0c6d4e55";

#[derive(Default)]
pub struct MockProvisioning {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    pub requests: Mutex<Vec<ProvisionUserRequest>>,
    pub validation: Mutex<Option<UserValidation>>,
}

impl MockProvisioning {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvisioningApi for MockProvisioning {
    async fn provision_user(&self, request: &ProvisionUserRequest) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unexpected {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }

    async fn validate_users(&self, _ids: &[String]) -> Result<UserValidation, BackendError> {
        let validation = self.validation.lock().clone();
        validation.ok_or_else(|| BackendError::Unexpected {
            status: 503,
            body: String::new(),
        })
    }
}

pub struct Harness {
    pub flow: SignUpFlow,
    pub backend: Arc<MockProvisioning>,
    pub auth_store: Arc<InMemoryAuthStore>,
    pub uploads: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let backend = Arc::new(MockProvisioning::default());
        let auth_store = Arc::new(InMemoryAuthStore::new());
        let store: Arc<dyn AuthStore> = auth_store.clone();
        let uploads = tempfile::tempdir().unwrap();

        let flow = SignUpFlow::new(
            Arc::new(LocalAuthProvider::new(store, SECRET)),
            backend.clone(),
            Arc::new(LocalImageStorage::new(uploads.path(), "/uploads")),
            timeout,
        );

        Self {
            flow,
            backend,
            auth_store,
            uploads,
        }
    }
}

pub fn account_input(email: &str) -> SignUpInput {
    SignUpInput {
        state: Some(SignUpState::Email),
        account_data: Some(AccountSubmission {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: Some("Secr3t!pass".into()),
            confirm_password: Some("Secr3t!pass".into()),
            profile_image: None,
        }),
        ..SignUpInput::default()
    }
}

pub fn user_data() -> UserData {
    UserData {
        phone_number: "555-0100".into(),
        date_of_birth: "1990-12-10".into(),
        address: Address {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
        },
        primary_care_specialist: SPECIALIST.into(),
    }
}

pub fn user_data_input() -> SignUpInput {
    SignUpInput {
        state: Some(SignUpState::UserData),
        user_data: Some(user_data()),
        ..SignUpInput::default()
    }
}

pub fn payment_input(paid: bool) -> SignUpInput {
    SignUpInput {
        state: Some(SignUpState::PaymentInfo),
        is_payment_successful: Some(paid),
        ..SignUpInput::default()
    }
}
