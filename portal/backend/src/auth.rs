//! Request cookies
//!
//! The sign-up session travels in a sealed cookie; the signed-in user is
//! resolved from the auth provider's session token cookie.

use crate::AppState;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use medportal_auth::AuthUser;
use medportal_signup::{read_cookie, CookieSessionStore, SessionError};

/// Value of cookie `name` across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| read_cookie(header, name))
}

/// Per-request sign-up session store seeded from the incoming cookie
pub fn session_store(state: &AppState, headers: &HeaderMap) -> CookieSessionStore {
    let value = cookie_value(headers, state.sealer.cookie_name());
    CookieSessionStore::from_cookie(state.sealer.clone(), value, state.cookies.secure)
}

/// Append the session's `Set-Cookie` header if the request changed it
pub fn attach_session_cookie(
    response: &mut Response,
    store: &CookieSessionStore,
) -> Result<(), SessionError> {
    if let Some(cookie) = store.set_cookie_header()? {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(())
}

/// `Set-Cookie` value for an auth provider session token
pub fn auth_cookie(state: &AppState, token: &str) -> String {
    let secure = if state.cookies.secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        state.cookies.auth_cookie_name, token, secure
    )
}

/// User behind the auth cookie. Lookup failures count as signed out.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let token = cookie_value(headers, &state.cookies.auth_cookie_name)?;

    match state.auth.get_session(token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Auth session lookup failed: {}", e);
            None
        }
    }
}
