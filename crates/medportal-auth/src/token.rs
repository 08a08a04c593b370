//! JWT session tokens and provider identity assertions

use crate::model::{AuthSession, SocialProfile, CREDENTIAL_PROVIDER};
use crate::{AuthError, AuthResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // user_id
    pub sid: String, // session id, must still exist in the store
    pub exp: usize,
}

/// HS256 signer for session tokens
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, session: &AuthSession) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sub: session.user_id.clone(),
            sid: session.id.clone(),
            exp: session.expires_at.timestamp().max(0) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }
}

// =============================================================================
// Identity Assertions
// =============================================================================

/// Claims of an id token signed by a social identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String, // provider id
    pub sub: String, // account id at the provider
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

impl From<IdTokenClaims> for SocialProfile {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            provider_id: claims.iss,
            account_id: claims.sub,
            name: claims.name,
            email: claims.email,
            image: claims.picture,
        }
    }
}

/// Verifies HS256 id tokens from a fixed set of providers.
///
/// Only a verified token yields a [`SocialProfile`]; the credential provider
/// is never an accepted issuer.
#[derive(Clone)]
pub struct IdTokenVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl IdTokenVerifier {
    /// `None` when there is no secret or no provider left to trust
    pub fn new(secret: &[u8], providers: &[String]) -> Option<Self> {
        let providers: Vec<&str> = providers
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty() && *p != CREDENTIAL_PROVIDER)
            .collect();
        if secret.is_empty() || providers.is_empty() {
            return None;
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&providers);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Some(Self {
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn verify(&self, id_token: &str) -> AuthResult<SocialProfile> {
        let token_data = decode::<IdTokenClaims>(id_token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?;
        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDER_SECRET: &[u8] = b"provider-signing-secret-0123456789";

    fn claims(iss: &str) -> IdTokenClaims {
        IdTokenClaims {
            iss: iss.into(),
            sub: "g-42".into(),
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            picture: None,
            exp: (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp() as usize,
        }
    }

    fn sign(claims: &IdTokenClaims, secret: &[u8]) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn verifier() -> IdTokenVerifier {
        IdTokenVerifier::new(PROVIDER_SECRET, &["google".to_string()]).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new(b"a-test-secret-that-is-long-enough");
        let session = AuthSession::new("user-1", chrono::Duration::hours(1));

        let token = signer.issue(&session).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.sid, session.id);

        let other = TokenSigner::new(b"some-other-secret-entirely-here!");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_id_token_yields_profile() {
        let profile = verifier()
            .verify(&sign(&claims("google"), PROVIDER_SECRET))
            .unwrap();
        assert_eq!(profile.provider_id, "google");
        assert_eq!(profile.account_id, "g-42");
        assert_eq!(profile.email, "grace@example.com");
    }

    #[test]
    fn test_id_token_rejections() {
        let verifier = verifier();

        let forged = sign(&claims("google"), b"attacker-chosen-secret-0123456789");
        assert!(matches!(verifier.verify(&forged), Err(AuthError::InvalidIdentity(_))));

        let untrusted = sign(&claims("github"), PROVIDER_SECRET);
        assert!(verifier.verify(&untrusted).is_err());

        let mut expired = claims("google");
        expired.exp = (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp() as usize;
        assert!(verifier.verify(&sign(&expired, PROVIDER_SECRET)).is_err());

        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_verifier_needs_secret_and_provider() {
        assert!(IdTokenVerifier::new(b"", &["google".to_string()]).is_none());
        assert!(IdTokenVerifier::new(PROVIDER_SECRET, &[]).is_none());
        assert!(IdTokenVerifier::new(PROVIDER_SECRET, &[CREDENTIAL_PROVIDER.to_string()]).is_none());
    }
}
