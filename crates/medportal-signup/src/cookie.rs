//! Sealed session cookies
//!
//! Cookie value = base64url(nonce ‖ ChaCha20-Poly1305(envelope)). The key is
//! SHA-256 of the configured secret and the cookie name is bound in as
//! associated data, so a value sealed for one cookie never opens as another.

use crate::session::SignUpSession;
use crate::SessionError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Serialize, Deserialize)]
struct Envelope {
    sid: String,
    data: SignUpSession,
}

#[derive(Clone)]
pub struct SessionSealer {
    key: [u8; 32],
    cookie_name: String,
    rng: SystemRandom,
}

impl SessionSealer {
    pub fn new(secret: &str, cookie_name: &str) -> Result<Self, SessionError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::SecretTooShort {
                min: MIN_SECRET_LEN,
            });
        }

        Ok(Self {
            key: Sha256::digest(secret.as_bytes()).into(),
            cookie_name: cookie_name.to_string(),
            rng: SystemRandom::new(),
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn aead_key(&self) -> Result<LessSafeKey, SessionError> {
        let unbound =
            UnboundKey::new(&CHACHA20_POLY1305, &self.key).map_err(|_| SessionError::Crypto)?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Seal a session under the given session id
    pub fn seal(&self, sid: &str, session: &SignUpSession) -> Result<String, SessionError> {
        let envelope = Envelope {
            sid: sid.to_string(),
            data: session.clone(),
        };
        let mut in_out = serde_json::to_vec(&envelope)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SessionError::Crypto)?;

        self.aead_key()?
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(self.cookie_name.as_bytes()),
                &mut in_out,
            )
            .map_err(|_| SessionError::Crypto)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a cookie value, returning the session id and session
    pub fn open(&self, value: &str) -> Result<(String, SignUpSession), SessionError> {
        let sealed = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| SessionError::Malformed)?;
        if sealed.len() <= NONCE_LEN {
            return Err(SessionError::Malformed);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| SessionError::Malformed)?;
        let mut in_out = ciphertext.to_vec();

        let plaintext = self
            .aead_key()?
            .open_in_place(nonce, Aad::from(self.cookie_name.as_bytes()), &mut in_out)
            .map_err(|_| SessionError::Tampered)?;

        let envelope: Envelope = serde_json::from_slice(plaintext)?;
        Ok((envelope.sid, envelope.data))
    }
}

impl fmt::Debug for SessionSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSealer")
            .field("cookie_name", &self.cookie_name)
            .field("key", &"<redacted>")
            .finish()
    }
}
