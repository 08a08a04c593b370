//! Response Models

use medportal_forms::{LayoutNode, RenderNode};
use medportal_signup::SignUpSession;
use serde::{Deserialize, Serialize};

/// Social sign-on body: an id token signed by the identity provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignIn {
    pub id_token: String,
}

#[derive(Clone, Deserialize)]
pub struct EmailSignIn {
    pub email: String,
    pub password: String,
}

/// Step page payload: the stored session plus the rendered step form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPage {
    pub session: SignUpSession,
    pub form: Vec<RenderNode>,
}

/// Payment step payload with the checkout return URLs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    pub session: SignUpSession,
    pub checkout: CheckoutUrls,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormLayout {
    pub form: String,
    pub layout: Vec<LayoutNode>,
}
