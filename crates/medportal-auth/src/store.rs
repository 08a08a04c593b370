//! Auth store
//!
//! Repository trait over users, sessions and linked accounts, with an
//! in-memory implementation that behaves like a relational store with
//! non-cascading foreign keys.

use crate::model::{normalize_email, AuthSession, AuthUser, LinkedAccount};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn list_user_ids(&self) -> AuthResult<Vec<String>>;

    /// Insert a user. Fails with [`AuthError::UserExists`] on a duplicate e-mail.
    async fn insert_user(&self, user: &AuthUser) -> AuthResult<()>;
    async fn find_user(&self, id: &str) -> AuthResult<Option<AuthUser>>;
    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<AuthUser>>;

    async fn insert_session(&self, session: &AuthSession) -> AuthResult<()>;
    async fn find_session(&self, id: &str) -> AuthResult<Option<AuthSession>>;

    async fn insert_account(&self, account: &LinkedAccount) -> AuthResult<()>;
    async fn find_account(
        &self,
        provider_id: &str,
        account_id: &str,
    ) -> AuthResult<Option<LinkedAccount>>;

    /// Returns the number of sessions removed
    async fn delete_sessions_for(&self, user_id: &str) -> AuthResult<usize>;
    /// Returns the number of accounts removed
    async fn delete_accounts_for(&self, user_id: &str) -> AuthResult<usize>;
    /// Remove a user row. Fails with [`AuthError::Constraint`] while sessions
    /// or accounts still reference it; returns `false` if it was already gone.
    async fn delete_user(&self, user_id: &str) -> AuthResult<bool>;

    async fn user_exists(&self, user_id: &str) -> AuthResult<bool>;
    async fn has_sessions(&self, user_id: &str) -> AuthResult<bool>;
    async fn has_accounts(&self, user_id: &str) -> AuthResult<bool>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, AuthUser>,
    sessions: HashMap<String, AuthSession>,
    accounts: HashMap<String, LinkedAccount>,
}

/// In-memory auth store
pub struct InMemoryAuthStore {
    tables: RwLock<Tables>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStore for InMemoryAuthStore {
    async fn list_user_ids(&self) -> AuthResult<Vec<String>> {
        let mut ids: Vec<_> = self.tables.read().users.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn insert_user(&self, user: &AuthUser) -> AuthResult<()> {
        let user = AuthUser {
            email: normalize_email(&user.email),
            ..user.clone()
        };
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::UserExists(user.email));
        }
        tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_user(&self, id: &str) -> AuthResult<Option<AuthUser>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<AuthUser>> {
        let email = normalize_email(email);
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&session.user_id) {
            return Err(AuthError::Constraint(format!(
                "session references missing user {}",
                session.user_id
            )));
        }
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, id: &str) -> AuthResult<Option<AuthSession>> {
        Ok(self.tables.read().sessions.get(id).cloned())
    }

    async fn insert_account(&self, account: &LinkedAccount) -> AuthResult<()> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&account.user_id) {
            return Err(AuthError::Constraint(format!(
                "account references missing user {}",
                account.user_id
            )));
        }
        tables.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn find_account(
        &self,
        provider_id: &str,
        account_id: &str,
    ) -> AuthResult<Option<LinkedAccount>> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .find(|a| a.provider_id == provider_id && a.account_id == account_id)
            .cloned())
    }

    async fn delete_sessions_for(&self, user_id: &str) -> AuthResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok(before - tables.sessions.len())
    }

    async fn delete_accounts_for(&self, user_id: &str) -> AuthResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.accounts.len();
        tables.accounts.retain(|_, a| a.user_id != user_id);
        Ok(before - tables.accounts.len())
    }

    async fn delete_user(&self, user_id: &str) -> AuthResult<bool> {
        let mut tables = self.tables.write();
        let referenced = tables.sessions.values().any(|s| s.user_id == user_id)
            || tables.accounts.values().any(|a| a.user_id == user_id);
        if referenced {
            return Err(AuthError::Constraint(format!(
                "user {} is still referenced by sessions or accounts",
                user_id
            )));
        }
        Ok(tables.users.remove(user_id).is_some())
    }

    async fn user_exists(&self, user_id: &str) -> AuthResult<bool> {
        Ok(self.tables.read().users.contains_key(user_id))
    }

    async fn has_sessions(&self, user_id: &str) -> AuthResult<bool> {
        Ok(self
            .tables
            .read()
            .sessions
            .values()
            .any(|s| s.user_id == user_id))
    }

    async fn has_accounts(&self, user_id: &str) -> AuthResult<bool> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .any(|a| a.user_id == user_id))
    }
}
