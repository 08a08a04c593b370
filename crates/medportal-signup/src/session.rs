//! Sign-up session model
//!
//! [`SignUpSession`] is the serializable projection kept in the sealed
//! cookie. It never carries a password or image bytes; an uploaded image is
//! referenced by `profileImageRef` only.

use crate::redirect::Route;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignUpState {
    Email,
    UserData,
    PaymentInfo,
    Success,
    SocialSignOn,
    ProfileUpdate,
}

impl SignUpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignUpState::Email => "email",
            SignUpState::UserData => "user-data",
            SignUpState::PaymentInfo => "payment-info",
            SignUpState::Success => "success",
            SignUpState::SocialSignOn => "social-sign-on",
            SignUpState::ProfileUpdate => "profile-update",
        }
    }

    /// Reached once provisioning completed
    pub fn is_terminal(&self) -> bool {
        matches!(self, SignUpState::Success | SignUpState::ProfileUpdate)
    }
}

impl fmt::Display for SignUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_ref: Option<String>,
}

impl AccountData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub phone_number: String,
    pub date_of_birth: String,
    pub address: Address,
    pub primary_care_specialist: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SignUpState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_data: Option<AccountData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_user_id: Option<String>,
    #[serde(
        rename = "isPaymentSuccessfull",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_payment_successful: Option<bool>,
}

impl SignUpSession {
    /// Session left behind after provisioning: only the terminal state remains
    pub fn completed() -> Self {
        Self {
            state: Some(SignUpState::Success),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_some_and(|s| s.is_terminal())
    }

    pub fn payment_confirmed(&self) -> bool {
        self.is_payment_successful.unwrap_or(false)
    }

    /// Step an interrupted sign-up resumes at
    pub fn resume_route(&self) -> Route {
        if self.is_completed() {
            Route::Dashboard
        } else if self.created_user_id.is_none() && self.account_data.is_none() {
            Route::SignUp
        } else if self.user_data.is_none() {
            Route::UserData
        } else {
            Route::PaymentInfo
        }
    }
}

/// Uploaded profile image; bytes travel base64-encoded in JSON
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl ProfileImage {
    /// Extension taken from the file name, without the dot
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Debug for ProfileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Account step as submitted by the client
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSubmission {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
}

impl AccountSubmission {
    /// Session projection: password and image bytes are dropped
    pub fn to_account_data(&self, profile_image_ref: Option<String>) -> AccountData {
        AccountData {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            profile_image_ref,
        }
    }
}

impl fmt::Debug for AccountSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSubmission")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("profile_image", &self.profile_image)
            .finish()
    }
}

/// Body of a sign-up submission. `state` names the step the client believes
/// it is submitting.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[serde(default)]
    pub state: Option<SignUpState>,
    #[serde(default)]
    pub account_data: Option<AccountSubmission>,
    #[serde(default)]
    pub user_data: Option<UserData>,
    #[serde(rename = "isPaymentSuccessfull", default)]
    pub is_payment_successful: Option<bool>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_wire_names() {
        let session = SignUpSession {
            state: Some(SignUpState::PaymentInfo),
            created_user_id: Some("u-1".into()),
            is_payment_successful: Some(true),
            ..SignUpSession::default()
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            json!({ "state": "payment-info", "createdUserId": "u-1", "isPaymentSuccessfull": true })
        );
    }

    #[test]
    fn test_input_accepts_base64_image_and_redacts_password() {
        let input: SignUpInput = serde_json::from_value(json!({
            "state": "email",
            "accountData": {
                "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com",
                "password": "Secr3t!pass", "confirmPassword": "Secr3t!pass",
                "profileImage": { "fileName": "me.png", "bytes": "iVBORw0K" }
            }
        }))
        .unwrap();

        let account = input.account_data.unwrap();
        let image = account.profile_image.clone().unwrap();
        assert_eq!(image.extension(), Some("png"));
        assert_eq!(image.bytes, [0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
        assert!(!format!("{:?}", account).contains("Secr3t!pass"));

        let data = account.to_account_data(Some("/uploads/profile/x.png".into()));
        let json = serde_json::to_string(&data).unwrap();
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_resume_route() {
        let mut session = SignUpSession::default();
        assert_eq!(session.resume_route(), Route::SignUp);

        session.created_user_id = Some("u-1".into());
        assert_eq!(session.resume_route(), Route::UserData);

        session.user_data = Some(UserData::default());
        assert_eq!(session.resume_route(), Route::PaymentInfo);

        assert_eq!(SignUpSession::completed().resume_route(), Route::Dashboard);
    }
}
