//! Sign-up session stores
//!
//! [`SessionStore`] is keyed by session id. [`MemorySessionStore`] keeps
//! sessions server-side; [`CookieSessionStore`] lives for one request, starts
//! from the incoming sealed cookie and renders the `Set-Cookie` header for
//! whatever the flow wrote.

use crate::cookie::SessionSealer;
use crate::session::SignUpSession;
use crate::SessionError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session; an unknown id yields an empty session
    async fn load(&self, sid: &str) -> Result<SignUpSession, SessionError>;
    async fn update(&self, sid: &str, session: SignUpSession) -> Result<(), SessionError>;
    async fn clear(&self, sid: &str) -> Result<(), SessionError>;
}

// =============================================================================
// Memory Store
// =============================================================================

pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SignUpSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, sid: &str) -> Result<SignUpSession, SessionError> {
        Ok(self.sessions.read().get(sid).cloned().unwrap_or_default())
    }

    async fn update(&self, sid: &str, session: SignUpSession) -> Result<(), SessionError> {
        self.sessions.write().insert(sid.to_string(), session);
        Ok(())
    }

    async fn clear(&self, sid: &str) -> Result<(), SessionError> {
        self.sessions.write().remove(sid);
        Ok(())
    }
}

// =============================================================================
// Cookie Store
// =============================================================================

enum Pending {
    Unchanged,
    Write,
    Clear,
}

struct CookieState {
    session: SignUpSession,
    pending: Pending,
}

pub struct CookieSessionStore {
    sealer: SessionSealer,
    sid: String,
    secure: bool,
    state: Mutex<CookieState>,
}

impl CookieSessionStore {
    /// Start from the incoming cookie value. Unreadable cookies start a fresh
    /// session under a new id.
    pub fn from_cookie(sealer: SessionSealer, value: Option<&str>, secure: bool) -> Self {
        let (sid, session) = match value.map(|v| sealer.open(v)) {
            Some(Ok(opened)) => opened,
            Some(Err(e)) => {
                tracing::warn!("Discarding unreadable sign-up session cookie: {}", e);
                (Uuid::new_v4().to_string(), SignUpSession::default())
            }
            None => (Uuid::new_v4().to_string(), SignUpSession::default()),
        };

        Self {
            sealer,
            sid,
            secure,
            state: Mutex::new(CookieState {
                session,
                pending: Pending::Unchanged,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.sid
    }

    pub fn snapshot(&self) -> SignUpSession {
        self.state.lock().session.clone()
    }

    /// `Set-Cookie` value for the pending write, if the session changed
    pub fn set_cookie_header(&self) -> Result<Option<String>, SessionError> {
        let state = self.state.lock();
        let name = self.sealer.cookie_name();
        let secure = if self.secure { "; Secure" } else { "" };

        match state.pending {
            Pending::Unchanged => Ok(None),
            Pending::Write => {
                let value = self.sealer.seal(&self.sid, &state.session)?;
                Ok(Some(format!(
                    "{name}={value}; Path=/; HttpOnly; SameSite=Lax{secure}"
                )))
            }
            Pending::Clear => Ok(Some(format!(
                "{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}"
            ))),
        }
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn load(&self, sid: &str) -> Result<SignUpSession, SessionError> {
        if sid != self.sid {
            return Ok(SignUpSession::default());
        }
        Ok(self.snapshot())
    }

    async fn update(&self, sid: &str, session: SignUpSession) -> Result<(), SessionError> {
        if sid != self.sid {
            tracing::warn!("Ignoring write to foreign sign-up session {}", sid);
            return Ok(());
        }
        let mut state = self.state.lock();
        state.session = session;
        state.pending = Pending::Write;
        Ok(())
    }

    async fn clear(&self, sid: &str) -> Result<(), SessionError> {
        if sid != self.sid {
            return Ok(());
        }
        let mut state = self.state.lock();
        state.session = SignUpSession::default();
        state.pending = Pending::Clear;
        Ok(())
    }
}

/// Value of cookie `name` in a `Cookie` request header
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SignUpState;

    fn sealer() -> SessionSealer {
        SessionSealer::new("0123456789abcdef0123456789abcdef", "signup-session").unwrap()
    }

    #[tokio::test]
    async fn test_cookie_store_roundtrips_through_header() {
        let store = CookieSessionStore::from_cookie(sealer(), None, true);
        assert!(store.set_cookie_header().unwrap().is_none());

        let sid = store.session_id().to_string();
        let session = SignUpSession {
            state: Some(SignUpState::UserData),
            created_user_id: Some("u-1".into()),
            ..SignUpSession::default()
        };
        store.update(&sid, session.clone()).await.unwrap();

        let header = store.set_cookie_header().unwrap().unwrap();
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.ends_with("; Secure"));

        let value = read_cookie(header.split(';').next().unwrap(), "signup-session").unwrap();
        let next = CookieSessionStore::from_cookie(sealer(), Some(value), true);
        assert_eq!(next.session_id(), sid);
        assert_eq!(next.load(&sid).await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_clear_expires_cookie() {
        let store = CookieSessionStore::from_cookie(sealer(), None, false);
        let sid = store.session_id().to_string();
        store.clear(&sid).await.unwrap();

        let header = store.set_cookie_header().unwrap().unwrap();
        assert!(header.starts_with("signup-session=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(!header.contains("Secure"));
    }

    #[tokio::test]
    async fn test_garbage_cookie_starts_fresh() {
        let store = CookieSessionStore::from_cookie(sealer(), Some("garbage"), false);
        let sid = store.session_id().to_string();
        assert!(store.load(&sid).await.unwrap().is_empty());
    }

    #[test]
    fn test_read_cookie() {
        let header = "theme=dark; signup-session=abc; other=1";
        assert_eq!(read_cookie(header, "signup-session"), Some("abc"));
        assert_eq!(read_cookie(header, "missing"), None);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load("s").await.unwrap().is_empty());
        store.update("s", SignUpSession::completed()).await.unwrap();
        assert!(store.load("s").await.unwrap().is_completed());
        store.clear("s").await.unwrap();
        assert!(store.load("s").await.unwrap().is_empty());
    }
}
