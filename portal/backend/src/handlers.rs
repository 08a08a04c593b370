//! API Handlers

use crate::auth::{attach_session_cookie, auth_cookie, current_user, session_store};
use crate::error::ApiError;
use crate::models::*;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use medportal_auth::AuthError;
use medportal_common::{attempt, Outcome};
use medportal_forms::{build_layout_tree, render_form, FormState};
use medportal_signup::forms::{form_by_name, user_data_form};
use medportal_signup::{
    guard_payment_info_page, guard_user_data_page, CookieSessionStore, Notice, PageGuard,
    SessionStore, SignUpInput, SignUpSession, SocialUser,
};
use medportal_sync::SyncReport;

type StepRedirect = medportal_signup::Redirect;
type StepRoute = medportal_signup::Route;

pub async fn health() -> &'static str {
    "OK"
}

fn see_other(redirect: StepRedirect) -> Response {
    Redirect::to(&redirect.location()).into_response()
}

/// Final response with the session cookie applied, on success and failure
fn with_session(result: Result<Response, ApiError>, store: &CookieSessionStore) -> Response {
    let mut response = result.unwrap_or_else(|e| e.into_response());
    if let Err(e) = attach_session_cookie(&mut response, store) {
        return ApiError::from(e).into_response();
    }
    response
}

// Sign-up

pub async fn submit_sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SignUpInput>,
) -> Response {
    let store = session_store(&state, &headers);
    let result = state
        .flow
        .submit(&store, store.session_id(), input)
        .await
        .map(see_other)
        .map_err(ApiError::from);
    with_session(result, &store)
}

pub async fn get_sign_up_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let store = session_store(&state, &headers);
    let outcome: Outcome<SignUpSession, String> = attempt(store.load(store.session_id())).await;
    with_session(Ok(Json(outcome).into_response()), &store)
}

pub async fn user_data_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_store(&state, &headers).snapshot();

    match guard_user_data_page(&session) {
        PageGuard::Redirect(to) => see_other(to),
        PageGuard::Render => {
            let values = session
                .user_data
                .as_ref()
                .and_then(|data| serde_json::to_value(data).ok())
                .and_then(|value| FormState::with_values(value).ok())
                .unwrap_or_default();
            let form = render_form(&user_data_form(&[]), &values);
            Json(StepPage { session, form }).into_response()
        }
    }
}

pub async fn payment_info_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_store(&state, &headers).snapshot();
    let user = current_user(&state, &headers).await;

    match guard_payment_info_page(&session, user.as_ref().map(|u| u.id.as_str())) {
        PageGuard::Redirect(to) => see_other(to),
        PageGuard::Render => {
            let base = &state.cookies.public_url;
            let cancel = StepRedirect::to(StepRoute::PaymentInfo).with_notice(Notice::Cancelled);
            Json(PaymentPage {
                session,
                checkout: CheckoutUrls {
                    success_url: format!("{base}/auth/callback/stripe"),
                    cancel_url: format!("{base}{}", cancel.location()),
                },
            })
            .into_response()
        }
    }
}

/// Checkout return: the browser always lands on a page
pub async fn stripe_callback(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let store = session_store(&state, &headers);
    let redirect = match state.flow.complete_signup(&store, store.session_id()).await {
        Ok(redirect) => redirect,
        Err(e) => {
            tracing::error!("Payment callback failed: {}", e);
            e.checkout_redirect()
        }
    };
    with_session(Ok(see_other(redirect)), &store)
}

// Sign-in

/// 303 to `location` carrying the auth session cookie
fn signed_in(state: &AppState, location: &str, token: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    if let Ok(value) = HeaderValue::from_str(&auth_cookie(state, token)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

pub async fn sign_in_email(
    State(state): State<AppState>,
    Json(body): Json<EmailSignIn>,
) -> Result<Response, ApiError> {
    let (user, token) = state.auth.sign_in_email(&body.email, &body.password).await?;
    tracing::info!("User {} signed in with e-mail", user.id);
    Ok(signed_in(&state, StepRoute::Dashboard.path(), &token))
}

pub async fn sign_in_social(
    State(state): State<AppState>,
    Json(body): Json<SocialSignIn>,
) -> Result<Response, ApiError> {
    let verifier = state
        .id_tokens
        .as_ref()
        .ok_or_else(|| AuthError::Unavailable("social sign-on is not configured".to_string()))?;
    let profile = verifier.verify(&body.id_token)?;

    let (user, token) = state.auth.sign_in_social(&profile).await?;
    tracing::info!("User {} signed in via {}", user.id, profile.provider_id);
    Ok(signed_in(
        &state,
        &format!("/auth/social-callback/{}", user.id),
        &token,
    ))
}

pub async fn social_callback(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let store = session_store(&state, &headers);
    let user = current_user(&state, &headers)
        .await
        .filter(|user| user.id == user_id)
        .map(|user| SocialUser::from(&user));

    let result = state
        .flow
        .check_is_new_user(&store, store.session_id(), user.as_ref())
        .await
        .map(|check| {
            let route = if check.is_new_user {
                StepRoute::UserData
            } else {
                StepRoute::Dashboard
            };
            see_other(StepRedirect::to(route))
        })
        .map_err(ApiError::from);
    with_session(result, &store)
}

// Forms

pub async fn form_layout(Path(form): Path<String>) -> Result<Json<FormLayout>, ApiError> {
    let configs = form_by_name(&form, &[]).ok_or_else(|| ApiError::NotFound(format!("form {form}")))?;
    Ok(Json(FormLayout {
        layout: build_layout_tree(&configs),
        form,
    }))
}

// Admin

pub async fn admin_sync(State(state): State<AppState>) -> Json<Outcome<SyncReport, String>> {
    Json(state.sync.run_once().await)
}
