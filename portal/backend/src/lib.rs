//! Patient Portal API Backend
//!
//! Axum server for the patient portal: the sign-up state machine, step page
//! guards, e-mail and social sign-in, form layouts and the startup user sync.

use axum::{
    routing::{get, post},
    Router,
};
use medportal_auth::{AuthProvider, IdTokenVerifier};
use medportal_common::PortalConfig;
use medportal_signup::{SessionError, SessionSealer, SignUpFlow};
use medportal_sync::SyncGate;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;

use handlers::*;

#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<SignUpFlow>,
    pub auth: Arc<dyn AuthProvider>,
    pub sync: Arc<SyncGate>,
    pub sealer: SessionSealer,
    pub cookies: Arc<CookieSettings>,
    /// `None` while social sign-on is not configured
    pub id_tokens: Option<IdTokenVerifier>,
}

/// Cookie and URL settings shared by the handlers
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub auth_cookie_name: String,
    pub secure: bool,
    pub public_url: String,
}

impl AppState {
    pub fn new(
        config: &PortalConfig,
        flow: Arc<SignUpFlow>,
        auth: Arc<dyn AuthProvider>,
        sync: Arc<SyncGate>,
    ) -> Result<Self, SessionError> {
        let sealer = SessionSealer::new(&config.session.secret, &config.session.cookie_name)?;
        let id_tokens = IdTokenVerifier::new(
            config.social.id_token_secret.as_bytes(),
            &config.social.providers,
        );
        if id_tokens.is_none() {
            tracing::warn!("Social sign-on disabled: no id token secret or provider configured");
        }

        Ok(Self {
            flow,
            auth,
            sync,
            sealer,
            cookies: Arc::new(CookieSettings {
                auth_cookie_name: config.session.auth_cookie_name.clone(),
                secure: config.server.production,
                public_url: config.server.public_url.trim_end_matches('/').to_string(),
            }),
            id_tokens,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))

        // Sign-up
        .route("/auth/sign-up", post(submit_sign_up))
        .route("/auth/sign-up/session", get(get_sign_up_session))
        .route("/auth/sign-up/user-data", get(user_data_page))
        .route("/auth/sign-up/payment-info", get(payment_info_page))
        .route("/auth/callback/stripe", get(stripe_callback))

        // Sign-in
        .route("/auth/sign-in/email", post(sign_in_email))
        .route("/auth/sign-in/social", post(sign_in_social))
        .route("/auth/social-callback/:user_id", get(social_callback))

        // Forms
        .route("/forms/:form/layout", get(form_layout))

        // Admin
        .route("/admin/sync", get(admin_sync))

        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
