//! Argon2 password hashes in PHC string form

use crate::{AuthError, AuthResult};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Credential(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for anything that is not a PHC string
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("Stored credential is not a valid password hash");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_argon2() {
        let first = hash_password("Secr3t!pass").unwrap();
        let second = hash_password("Secr3t!pass").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("Secr3t!pass"));

        assert!(verify_password("Secr3t!pass", &first));
        assert!(verify_password("Secr3t!pass", &second));
        assert!(!verify_password("wrong", &first));
    }

    #[test]
    fn test_legacy_or_garbage_hash_never_verifies() {
        // salt$sha256 layout
        let legacy = "e8b4fd8a0c1d2e3f4a5b6c7d8e9f0a1b$0169d31e";
        assert!(!verify_password("Secr3t!pass", legacy));
        assert!(!verify_password("Secr3t!pass", "not-a-hash"));
        assert!(!verify_password("", ""));
    }
}
