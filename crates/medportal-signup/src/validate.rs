//! Server-side checks for the account and user-data steps. Issue paths match
//! the form field paths (`address.city`).

use crate::session::{AccountSubmission, UserData};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

fn is_email(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
    })
    .as_ref()
    .is_some_and(|re| re.is_match(value))
}

fn is_uuid(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .ok()
    })
    .as_ref()
    .is_some_and(|re| re.is_match(value))
}

const SPECIAL_CHARS: &str = r#"!@#$%^&*()_-+=[]{};':"\|,.<>/?~"#;

/// Messages for every password rule the value breaks
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        issues.push("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("Password needs an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("Password needs a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password needs a number");
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        issues.push("Password needs a special character");
    }
    issues
}

pub fn validate_account(account: &AccountSubmission) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if account.first_name.trim().is_empty() {
        issues.push(FieldIssue::new("firstName", "First name cannot be empty"));
    }
    if account.last_name.trim().is_empty() {
        issues.push(FieldIssue::new("lastName", "Last name cannot be empty"));
    }
    if account.email.is_empty() {
        issues.push(FieldIssue::new("email", "Email cannot be empty"));
    } else if !is_email(&account.email) {
        issues.push(FieldIssue::new("email", "It must be a valid email"));
    }

    let password = account.password.as_deref().unwrap_or_default();
    for message in password_issues(password) {
        issues.push(FieldIssue::new("password", message));
    }
    if account.confirm_password.as_deref() != Some(password) {
        issues.push(FieldIssue::new("confirmPassword", "Passwords don't match"));
    }

    issues
}

pub fn validate_user_data(data: &UserData) -> Vec<FieldIssue> {
    let required = [
        ("phoneNumber", &data.phone_number, "Phone number cannot be empty"),
        ("dateOfBirth", &data.date_of_birth, "Date of birth cannot be empty"),
        ("address.street", &data.address.street, "Street cannot be empty"),
        ("address.city", &data.address.city, "City cannot be empty"),
        ("address.state", &data.address.state, "State cannot be empty"),
        ("address.zipCode", &data.address.zip_code, "Zip code cannot be empty"),
    ];

    let mut issues: Vec<_> = required
        .iter()
        .filter(|(_, value, _)| value.trim().is_empty())
        .map(|(path, _, message)| FieldIssue::new(path, message))
        .collect();

    if data.primary_care_specialist.is_empty() {
        issues.push(FieldIssue::new(
            "primaryCareSpecialist",
            "Primary care specialist is required",
        ));
    } else if !is_uuid(&data.primary_care_specialist) {
        issues.push(FieldIssue::new(
            "primaryCareSpecialist",
            "Primary care specialist must be a valid id",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Address;

    fn account(password: &str, confirm: &str) -> AccountSubmission {
        AccountSubmission {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: Some(password.into()),
            confirm_password: Some(confirm.into()),
            profile_image: None,
        }
    }

    fn user_data() -> UserData {
        UserData {
            phone_number: "555-0100".into(),
            date_of_birth: "1990-12-10".into(),
            address: Address {
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip_code: "62701".into(),
            },
            primary_care_specialist: "0b9b3c8e-3f5e-4c1a-9d7e-2a1f0c6d4e55".into(),
        }
    }

    #[test]
    fn test_valid_account() {
        assert!(validate_account(&account("Secr3t!pass", "Secr3t!pass")).is_empty());
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(
            password_issues("abc"),
            [
                "Password must be at least 8 characters",
                "Password needs an uppercase letter",
                "Password needs a number",
                "Password needs a special character",
            ]
        );

        let issues = validate_account(&account("Secr3t!pass", "Secr3t!pas"));
        assert_eq!(issues, [FieldIssue::new("confirmPassword", "Passwords don't match")]);
    }

    #[test]
    fn test_email_shape() {
        let mut submission = account("Secr3t!pass", "Secr3t!pass");
        submission.email = "not-an-email".into();
        let issues = validate_account(&submission);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "email");
    }

    #[test]
    fn test_user_data_paths() {
        assert!(validate_user_data(&user_data()).is_empty());

        let mut data = user_data();
        data.address.city = " ".into();
        data.primary_care_specialist = "dr-house".into();
        let paths: Vec<_> = validate_user_data(&data).into_iter().map(|i| i.path).collect();
        assert_eq!(paths, ["address.city", "primaryCareSpecialist"]);
    }
}
