//! Sign-up state machine
//!
//! | Input state      | Requires (stored session)                      | Next                |
//! |------------------|------------------------------------------------|---------------------|
//! | `email`          | password submitted                             | `user-data`         |
//! | `user-data`      | user data submitted                            | `payment-info`      |
//! | `payment-info`   | user id, account and user data; payment flag   | dashboard (success) |
//! | `profile-update` | sign-up completed                              | dashboard           |
//! | anything else    |                                                | sign-up             |
//!
//! Submissions for one session id are serialized. Provisioning is attempted
//! only after payment and at most once per user; a failure keeps the session.

use crate::redirect::{Notice, Redirect, Route};
use crate::session::{AccountSubmission, SignUpInput, SignUpSession, SignUpState, UserData};
use crate::storage::{ImageStorage, PROFILE_FOLDER};
use crate::store::SessionStore;
use crate::validate::{validate_account, validate_user_data};
use crate::{Result, SignUpError};
use dashmap::DashMap;
use medportal_auth::AuthProvider;
use medportal_common::{ProvisionUserRequest, ProvisioningApi};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a step-page guard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageGuard {
    Render,
    Redirect(Redirect),
}

pub struct SignUpFlow {
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) provisioning: Arc<dyn ProvisioningApi>,
    images: Arc<dyn ImageStorage>,
    call_timeout: Duration,
    inflight: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    /// Users provisioned within `provisioned_retention`, pruned on insert
    provisioned: DashMap<String, Instant>,
    provisioned_retention: Duration,
}

/// How long a provisioned user is remembered to absorb replayed confirmations
pub const PROVISIONED_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

impl SignUpFlow {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        provisioning: Arc<dyn ProvisioningApi>,
        images: Arc<dyn ImageStorage>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            auth,
            provisioning,
            images,
            call_timeout,
            inflight: DashMap::new(),
            provisioned: DashMap::new(),
            provisioned_retention: PROVISIONED_RETENTION,
        }
    }

    pub fn with_provisioned_retention(mut self, retention: Duration) -> Self {
        self.provisioned_retention = retention;
        self
    }

    pub fn is_provisioned(&self, user_id: &str) -> bool {
        self.provisioned
            .get(user_id)
            .is_some_and(|at| at.elapsed() < self.provisioned_retention)
    }

    fn remember_provisioned(&self, user_id: &str) {
        let retention = self.provisioned_retention;
        self.provisioned.retain(|_, at| at.elapsed() < retention);
        self.provisioned.insert(user_id.to_string(), Instant::now());
    }

    /// Entry point for every step submission
    pub async fn submit(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        input: SignUpInput,
    ) -> Result<Redirect> {
        self.single_flight(sid, self.dispatch(store, sid, input)).await
    }

    /// Payment provider success callback
    pub async fn complete_signup(&self, store: &dyn SessionStore, sid: &str) -> Result<Redirect> {
        self.single_flight(sid, async {
            let stored = store.load(sid).await?;
            if stored.is_completed() {
                return Ok(Redirect::to(Route::Dashboard));
            }

            match provisioning_request(&stored) {
                Some(request) => self.provision(store, sid, stored, request).await,
                None => {
                    tracing::debug!("Payment callback without a resumable sign-up session");
                    Ok(Redirect::to(Route::SignUp))
                }
            }
        })
        .await
    }

    // =========================================================================
    // Steps
    // =========================================================================

    async fn dispatch(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        input: SignUpInput,
    ) -> Result<Redirect> {
        let stored = store.load(sid).await?;

        if stored.is_completed() && input.state != Some(SignUpState::ProfileUpdate) {
            tracing::info!(
                "Sign-up already completed, ignoring {} submission",
                input.state.map_or("unknown", |s| s.as_str())
            );
            return Ok(Redirect::to(Route::Dashboard));
        }

        match input.state {
            Some(SignUpState::Email) => {
                self.submit_account(store, sid, stored, input.account_data)
                    .await
            }
            Some(SignUpState::UserData) => {
                self.submit_user_data(store, sid, stored, input.user_data)
                    .await
            }
            Some(SignUpState::PaymentInfo) => {
                let Some(request) = provisioning_request(&stored) else {
                    return Ok(Redirect::to(Route::SignUp));
                };
                if !input.is_payment_successful.unwrap_or(false) {
                    return Ok(Redirect::to(Route::PaymentInfo));
                }
                self.provision(store, sid, stored, request).await
            }
            Some(SignUpState::ProfileUpdate) => {
                self.submit_profile_update(store, sid, stored, input.user_data)
                    .await
            }
            other => {
                tracing::debug!("No sign-up step for submitted state {:?}", other);
                Ok(Redirect::to(Route::SignUp))
            }
        }
    }

    async fn submit_account(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        stored: SignUpSession,
        account: Option<AccountSubmission>,
    ) -> Result<Redirect> {
        let Some(account) = account.filter(|a| a.password.is_some()) else {
            return Ok(Redirect::to(Route::SignUp));
        };

        // One auth account per sign-up session
        if let Some(user_id) = &stored.created_user_id {
            tracing::info!("Account {} already created for this sign-up, resuming", user_id);
            return Ok(Redirect::to(stored.resume_route()));
        }

        let issues = validate_account(&account);
        if !issues.is_empty() {
            tracing::debug!("Account step rejected with {} issue(s)", issues.len());
            return Ok(Redirect::to(Route::SignUp).with_notice(Notice::InvalidInput));
        }

        let image_ref = match &account.profile_image {
            Some(image) => Some(
                self.bounded("image upload", self.images.upload(image, Some(PROFILE_FOLDER)))
                    .await??,
            ),
            None => None,
        };

        let data = account.to_account_data(image_ref);
        let password = account.password.as_deref().unwrap_or_default();
        let created = self
            .bounded(
                "account creation",
                self.auth
                    .sign_up_email(&data.full_name(), &data.email, password, data.profile_image_ref.clone()),
            )
            .await
            .and_then(|result| result.map_err(SignUpError::from));

        let user = match created {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Account creation failed: {}", e);
                self.discard_image(data.profile_image_ref.as_deref()).await;
                return Err(e);
            }
        };

        store
            .update(
                sid,
                SignUpSession {
                    state: Some(SignUpState::UserData),
                    account_data: Some(data),
                    created_user_id: Some(user.id.clone()),
                    ..stored
                },
            )
            .await?;

        tracing::info!("Sign-up for user {} advanced to {}", user.id, SignUpState::UserData);
        Ok(Redirect::to(Route::UserData))
    }

    async fn submit_user_data(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        stored: SignUpSession,
        user_data: Option<UserData>,
    ) -> Result<Redirect> {
        let Some(user_data) = user_data else {
            return Ok(Redirect::to(Route::UserData));
        };

        let issues = validate_user_data(&user_data);
        if !issues.is_empty() {
            tracing::debug!("User data step rejected with {} issue(s)", issues.len());
            return Ok(Redirect::to(Route::UserData).with_notice(Notice::InvalidInput));
        }

        store
            .update(
                sid,
                SignUpSession {
                    state: Some(SignUpState::PaymentInfo),
                    user_data: Some(user_data),
                    ..stored
                },
            )
            .await?;

        tracing::info!("Sign-up session advanced to {}", SignUpState::PaymentInfo);
        Ok(Redirect::to(Route::PaymentInfo))
    }

    async fn submit_profile_update(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        stored: SignUpSession,
        user_data: Option<UserData>,
    ) -> Result<Redirect> {
        if !stored.is_completed() {
            return Ok(Redirect::to(Route::SignUp));
        }

        let Some(user_data) = user_data.filter(|d| validate_user_data(d).is_empty()) else {
            return Ok(Redirect::to(Route::Dashboard).with_notice(Notice::InvalidInput));
        };

        store
            .update(
                sid,
                SignUpSession {
                    state: Some(SignUpState::ProfileUpdate),
                    user_data: Some(user_data),
                    ..stored
                },
            )
            .await?;

        Ok(Redirect::to(Route::Dashboard))
    }

    async fn provision(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        mut session: SignUpSession,
        request: ProvisionUserRequest,
    ) -> Result<Redirect> {
        if self.is_provisioned(&request.user_id) {
            tracing::info!(
                "User {} already provisioned, skipping duplicate payment confirmation",
                request.user_id
            );
            store.update(sid, SignUpSession::completed()).await?;
            return Ok(Redirect::to(Route::Dashboard));
        }

        // Payment is captured from here on
        if !session.payment_confirmed() || session.state != Some(SignUpState::PaymentInfo) {
            session.is_payment_successful = Some(true);
            session.state = Some(SignUpState::PaymentInfo);
            store.update(sid, session).await?;
        }

        let outcome = match self
            .bounded("provisioning", self.provisioning.provision_user(&request))
            .await
        {
            Ok(result) => result.map_err(|e| SignUpError::provisioning(&request.user_id, e)),
            Err(_) => Err(SignUpError::ProvisioningFailed {
                user_id: request.user_id.clone(),
                reason: "provisioning call timed out".to_string(),
            }),
        };

        match outcome {
            Ok(()) => {
                self.remember_provisioned(&request.user_id);
                store.update(sid, SignUpSession::completed()).await?;
                tracing::info!("Sign-up for user {} completed", request.user_id);
                Ok(Redirect::to(Route::Dashboard))
            }
            Err(e) => {
                // The user has paid: never delete the account, keep the session
                tracing::error!(
                    "Provisioning failed after payment for user {}: {:?}",
                    request.user_id,
                    e
                );
                Err(e)
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run `op` while holding the per-session lock
    async fn single_flight<T>(&self, sid: &str, op: impl Future<Output = T>) -> T {
        let lock = self.inflight.entry(sid.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);
        self.inflight
            .remove_if(sid, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Bound an external call by the configured timeout
    pub(crate) async fn bounded<F: Future>(&self, what: &'static str, call: F) -> Result<F::Output> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| {
                tracing::warn!("{} exceeded {:?}", what, self.call_timeout);
                SignUpError::Timeout(what)
            })
    }

    async fn discard_image(&self, reference: Option<&str>) {
        let Some(reference) = reference else { return };
        if let Err(e) = self.images.delete(reference).await {
            tracing::warn!("Could not remove orphaned image {}: {}", reference, e);
        }
    }
}

/// Provisioning payload, if the session holds everything it needs
fn provisioning_request(session: &SignUpSession) -> Option<ProvisionUserRequest> {
    let user_id = session.created_user_id.as_ref()?;
    let account = session.account_data.as_ref()?;
    let data = session.user_data.as_ref()?;

    Some(ProvisionUserRequest {
        user_id: user_id.clone(),
        email: account.email.clone(),
        specialist_id: data.primary_care_specialist.clone(),
        first_name: account.first_name.clone(),
        last_name: account.last_name.clone(),
        phone: data.phone_number.clone(),
    })
}

// =============================================================================
// Step Page Guards
// =============================================================================

pub fn guard_user_data_page(session: &SignUpSession) -> PageGuard {
    if session.is_completed() {
        return PageGuard::Redirect(Redirect::to(Route::Dashboard));
    }
    if session.account_data.is_none() && session.created_user_id.is_none() {
        return PageGuard::Redirect(Redirect::to(Route::SignUp));
    }
    PageGuard::Render
}

/// `authenticated_user` is the id behind the auth cookie, if any. A signed-in
/// user other than the one this sign-up created has no business paying.
pub fn guard_payment_info_page(
    session: &SignUpSession,
    authenticated_user: Option<&str>,
) -> PageGuard {
    if let Some(user_id) = authenticated_user {
        if session.created_user_id.as_deref() != Some(user_id) {
            return PageGuard::Redirect(Redirect::to(Route::Dashboard));
        }
    }
    if session.is_completed() {
        return PageGuard::Redirect(Redirect::to(Route::Dashboard));
    }
    if session.account_data.is_none() && session.created_user_id.is_none() {
        return PageGuard::Redirect(Redirect::to(Route::SignUp));
    }
    if session.user_data.is_none() {
        return PageGuard::Redirect(Redirect::to(Route::UserData));
    }
    PageGuard::Render
}
