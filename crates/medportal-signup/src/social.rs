//! Social sign-on entry
//!
//! After an external identity provider signs a user in, the backend decides
//! whether that user still needs to be provisioned. Anything short of a
//! definite "known" answer counts as a new user.

use crate::flow::SignUpFlow;
use crate::session::{AccountData, SignUpSession, SignUpState};
use crate::store::SessionStore;
use crate::Result;
use medportal_auth::AuthUser;
use medportal_common::UserValidation;
use serde::Serialize;

/// Signed-in user as seen by the social callback
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&AuthUser> for SocialUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserCheck {
    pub is_new_user: bool,
}

/// First word is the first name, the rest the last name
pub fn split_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    (first, last)
}

impl SignUpFlow {
    /// Decide whether `user` still has to go through sign-up and, if so, seed
    /// the session at `social-sign-on`.
    pub async fn check_is_new_user(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        user: Option<&SocialUser>,
    ) -> Result<NewUserCheck> {
        let Some(user) = user else {
            return Ok(NewUserCheck { is_new_user: false });
        };

        let ids = [user.id.clone()];
        let is_new_user = match self
            .bounded("user validation", self.provisioning.validate_users(&ids))
            .await
        {
            Ok(Ok(UserValidation::AllValid)) => false,
            Ok(Ok(UserValidation::Invalid(_))) => true,
            Ok(Err(e)) => {
                tracing::warn!("User validation failed, assuming new user: {}", e);
                true
            }
            Err(_) => true,
        };

        if is_new_user {
            self.seed_social_session(store, sid, user).await?;
        }

        tracing::info!("Social sign-on for user {}: new user = {}", user.id, is_new_user);
        Ok(NewUserCheck { is_new_user })
    }

    async fn seed_social_session(
        &self,
        store: &dyn SessionStore,
        sid: &str,
        user: &SocialUser,
    ) -> Result<()> {
        let stored = store.load(sid).await?;

        match stored.created_user_id.as_deref() {
            Some(id) if id == user.id => return Ok(()),
            Some(other) => {
                tracing::warn!(
                    "Sign-up session belonged to user {}, restarting it for {}",
                    other,
                    user.id
                );
                store.clear(sid).await?;
            }
            None => {}
        }

        let (first_name, last_name) = split_name(&user.name);
        store
            .update(
                sid,
                SignUpSession {
                    state: Some(SignUpState::SocialSignOn),
                    created_user_id: Some(user.id.clone()),
                    account_data: Some(AccountData {
                        first_name,
                        last_name,
                        email: user.email.clone(),
                        profile_image_ref: None,
                    }),
                    ..SignUpSession::default()
                },
            )
            .await?;
        Ok(())
    }
}
