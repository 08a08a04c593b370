//! Navigation outcomes of the sign-up flow
//!
//! A [`Redirect`] is control flow, not an error: unmet preconditions send the
//! client back to the step that can satisfy them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    SignUp,
    UserData,
    PaymentInfo,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::SignUp => "/auth/sign-up",
            Route::UserData => "/auth/sign-up/user-data",
            Route::PaymentInfo => "/auth/sign-up/payment-info",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// Message shown on the target page, carried as `?error=`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    ProvisioningFailed,
    Cancelled,
    UnknownError,
    InvalidInput,
}

impl Notice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notice::ProvisioningFailed => "provisioning_failed",
            Notice::Cancelled => "cancelled",
            Notice::UnknownError => "unknown_error",
            Notice::InvalidInput => "invalid_input",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: Route,
    pub notice: Option<Notice>,
}

impl Redirect {
    pub fn to(route: Route) -> Self {
        Self {
            to: route,
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// `Location` header value
    pub fn location(&self) -> String {
        match self.notice {
            Some(notice) => format!("{}?error={}", self.to.path(), notice.as_str()),
            None => self.to.path().to_string(),
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}
