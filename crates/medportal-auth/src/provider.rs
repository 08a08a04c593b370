//! Auth provider operations used by the sign-up flow

use crate::model::{AuthSession, AuthUser, LinkedAccount, SocialProfile, CREDENTIAL_PROVIDER};
use crate::password::{hash_password, verify_password};
use crate::store::AuthStore;
use crate::token::TokenSigner;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an e-mail/password user
    async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
        image: Option<String>,
    ) -> AuthResult<AuthUser>;

    /// Check e-mail/password credentials and open a session
    async fn sign_in_email(&self, email: &str, password: &str) -> AuthResult<(AuthUser, String)>;

    /// Find or create the user behind a verified social identity and open a
    /// session. An identity is never attached to an existing user by e-mail.
    async fn sign_in_social(&self, profile: &SocialProfile) -> AuthResult<(AuthUser, String)>;

    /// Open a session for `user_id`, returning its token
    async fn create_session(&self, user_id: &str) -> AuthResult<String>;

    /// Resolve a session token. Unknown, expired or revoked tokens yield `None`.
    async fn get_session(&self, token: &str) -> AuthResult<Option<AuthUser>>;
}

/// [`AuthProvider`] backed by an [`AuthStore`]
pub struct LocalAuthProvider {
    store: Arc<dyn AuthStore>,
    signer: TokenSigner,
    session_ttl: chrono::Duration,
}

impl LocalAuthProvider {
    pub fn new(store: Arc<dyn AuthStore>, secret: &[u8]) -> Self {
        Self {
            store,
            signer: TokenSigner::new(secret),
            session_ttl: chrono::Duration::days(7),
        }
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<dyn AuthStore> {
        &self.store
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
        image: Option<String>,
    ) -> AuthResult<AuthUser> {
        let password_hash = hash_password(password)?;
        let user = AuthUser::new(name, email, image);
        self.store.insert_user(&user).await?;
        self.store
            .insert_account(&LinkedAccount {
                id: Uuid::new_v4().to_string(),
                user_id: user.id.clone(),
                provider_id: CREDENTIAL_PROVIDER.to_string(),
                account_id: user.id.clone(),
                password_hash: Some(password_hash),
            })
            .await?;

        tracing::info!("Created user {} via e-mail sign-up", user.id);
        Ok(user)
    }

    async fn sign_in_email(&self, email: &str, password: &str) -> AuthResult<(AuthUser, String)> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        let stored = self
            .store
            .find_account(CREDENTIAL_PROVIDER, &user.id)
            .await?
            .and_then(|account| account.password_hash);

        match stored {
            Some(hash) if verify_password(password, &hash) => {
                let token = self.create_session(&user.id).await?;
                Ok((user, token))
            }
            _ => {
                tracing::debug!("Rejected e-mail sign-in for user {}", user.id);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn sign_in_social(&self, profile: &SocialProfile) -> AuthResult<(AuthUser, String)> {
        if profile.provider_id == CREDENTIAL_PROVIDER {
            return Err(AuthError::InvalidIdentity(format!(
                "{} is not a social provider",
                profile.provider_id
            )));
        }

        let linked = self
            .store
            .find_account(&profile.provider_id, &profile.account_id)
            .await?;

        let user = match linked {
            Some(account) => self
                .store
                .find_user(&account.user_id)
                .await?
                .ok_or_else(|| AuthError::UserNotFound(account.user_id.clone()))?,
            None => {
                // Fails with UserExists when the e-mail already has an account
                let user = AuthUser::new(&profile.name, &profile.email, profile.image.clone());
                self.store.insert_user(&user).await?;
                self.store
                    .insert_account(&LinkedAccount {
                        id: Uuid::new_v4().to_string(),
                        user_id: user.id.clone(),
                        provider_id: profile.provider_id.clone(),
                        account_id: profile.account_id.clone(),
                        password_hash: None,
                    })
                    .await?;
                tracing::info!("Created user {} via {} sign-on", user.id, profile.provider_id);
                user
            }
        };

        let token = self.create_session(&user.id).await?;
        Ok((user, token))
    }

    async fn create_session(&self, user_id: &str) -> AuthResult<String> {
        let session = AuthSession::new(user_id, self.session_ttl);
        self.store.insert_session(&session).await?;
        Ok(self.signer.issue(&session)?)
    }

    async fn get_session(&self, token: &str) -> AuthResult<Option<AuthUser>> {
        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                return Ok(None);
            }
        };

        match self.store.find_session(&claims.sid).await? {
            Some(session) if !session.is_expired() && session.user_id == claims.sub => {
                self.store.find_user(&session.user_id).await
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAuthStore;

    const SECRET: &[u8] = b"provider-test-secret-0123456789ab";

    fn provider() -> LocalAuthProvider {
        LocalAuthProvider::new(Arc::new(InMemoryAuthStore::new()), SECRET)
    }

    fn profile() -> SocialProfile {
        SocialProfile {
            provider_id: "google".into(),
            account_id: "g-42".into(),
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_email_stores_hashed_credential() {
        let provider = provider();
        let user = provider
            .sign_up_email("Ada Lovelace", "ada@example.com", "Secr3t!pass", None)
            .await
            .unwrap();

        let account = provider
            .store()
            .find_account(CREDENTIAL_PROVIDER, &user.id)
            .await
            .unwrap()
            .unwrap();
        let hash = account.password_hash.unwrap();
        assert_ne!(hash, "Secr3t!pass");
        assert!(verify_password("Secr3t!pass", &hash));

        let dup = provider
            .sign_up_email("Ada", "ada@example.com", "Secr3t!pass", None)
            .await;
        assert!(matches!(dup, Err(AuthError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_social_sign_in_is_stable() {
        let provider = provider();
        let (first, token) = provider.sign_in_social(&profile()).await.unwrap();
        let (second, _) = provider.sign_in_social(&profile()).await.unwrap();
        assert_eq!(first.id, second.id);

        let resolved = provider.get_session(&token).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_deleting_sessions_revokes_tokens() {
        let provider = provider();
        let (user, token) = provider.sign_in_social(&profile()).await.unwrap();

        provider.store().delete_sessions_for(&user.id).await.unwrap();
        assert!(provider.get_session(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        assert!(provider().get_session("not-a-jwt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_social_identity_cannot_claim_existing_email() {
        let provider = provider();
        let victim = provider
            .sign_up_email("Ada Lovelace", "ada@example.com", "Secr3t!pass", None)
            .await
            .unwrap();

        let claimed = SocialProfile {
            provider_id: "google".into(),
            account_id: "attacker-chosen".into(),
            name: "Not Ada".into(),
            email: "Ada@Example.com".into(),
            image: None,
        };
        assert!(matches!(
            provider.sign_in_social(&claimed).await,
            Err(AuthError::UserExists(_))
        ));

        // Nothing was linked to the existing user
        assert!(provider
            .store()
            .find_account("google", "attacker-chosen")
            .await
            .unwrap()
            .is_none());
        assert!(!provider.store().has_sessions(&victim.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_credential_provider_is_not_a_social_identity() {
        let provider = provider();
        let user = provider
            .sign_up_email("Ada Lovelace", "ada@example.com", "Secr3t!pass", None)
            .await
            .unwrap();

        let spoofed = SocialProfile {
            provider_id: CREDENTIAL_PROVIDER.into(),
            account_id: user.id.clone(),
            name: "Ada".into(),
            email: "someone@example.com".into(),
            image: None,
        };
        assert!(matches!(
            provider.sign_in_social(&spoofed).await,
            Err(AuthError::InvalidIdentity(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_email_checks_password() {
        let provider = provider();
        let user = provider
            .sign_up_email("Ada Lovelace", "ada@example.com", "Secr3t!pass", None)
            .await
            .unwrap();

        let (signed_in, token) = provider
            .sign_in_email("ADA@example.com", "Secr3t!pass")
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);
        let resolved = provider.get_session(&token).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        assert!(matches!(
            provider.sign_in_email("ada@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            provider.sign_in_email("nobody@example.com", "Secr3t!pass").await,
            Err(AuthError::InvalidCredentials)
        ));

        // Social-only users have no password
        provider.sign_in_social(&profile()).await.unwrap();
        assert!(matches!(
            provider.sign_in_email("grace@example.com", "").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_session_ttl_bounds_token() {
        let provider = provider().with_session_ttl(chrono::Duration::seconds(-1));
        let (_, token) = provider.sign_in_social(&profile()).await.unwrap();
        assert!(provider.get_session(&token).await.unwrap().is_none());
    }
}
