//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use medportal_auth::AuthError;
use medportal_common::Outcome;
use medportal_signup::{SessionError, SignUpError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    SignUp(#[from] SignUpError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::SignUp(err.into())
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(Outcome::<(), String>::failure(message))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::SignUp(err) => {
                if let Some(redirect) = err.redirect() {
                    return Redirect::to(&redirect.location()).into_response();
                }
                let status = match &err {
                    SignUpError::AccountCreation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    SignUpError::Storage(StorageError::InvalidImage(_)) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    SignUpError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!("Sign-up request failed: {}", err);
                }
                let message = match &err {
                    SignUpError::Config(_) => "Service is not configured".to_string(),
                    other => other.to_string(),
                };
                failure(status, message)
            }
            ApiError::Auth(err) => {
                let status = match &err {
                    AuthError::UserExists(_) => StatusCode::CONFLICT,
                    AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
                    AuthError::InvalidCredentials | AuthError::InvalidIdentity(_) => {
                        StatusCode::UNAUTHORIZED
                    }
                    AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!("Auth request failed: {}", err);
                } else if status == StatusCode::UNAUTHORIZED {
                    tracing::warn!("Rejected sign-in: {}", err);
                }
                failure(status, err.to_string())
            }
            ApiError::NotFound(what) => failure(StatusCode::NOT_FOUND, format!("{what} not found")),
        }
    }
}
