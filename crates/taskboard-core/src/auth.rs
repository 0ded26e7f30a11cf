//! Password hashing and signed bearer tokens.
//!
//! Passwords are stored as `salt$digest` where the digest is
//! HMAC-SHA256(key = random salt, message = password), both halves
//! base64url. Tokens are `payload.signature`: a JSON claims blob signed
//! with the server's HMAC key, verified in constant time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CoreError, Result};
use crate::user::User;

type HmacSha256 = Hmac<Sha256>;

/// Tokens are good for a week, matching the original session length.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = password_digest(&salt, password);
    format!("{}${}", B64.encode(salt), B64.encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (B64.decode(salt_b64), B64.decode(digest_b64)) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn password_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(salt).expect("hmac accepts any key length");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

// ---------------------------------------------------------------------------
// Bearer tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub name: String,
    /// Unix timestamp after which the token is rejected.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { key: secret.into() }
    }

    /// Fresh random key. Tokens won't survive a restart; pass a stable
    /// secret in production.
    pub fn random() -> Self {
        let mut key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn issue(&self, user: &User) -> String {
        let claims = Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        self.issue_claims(&claims)
    }

    fn issue_claims(&self, claims: &Claims) -> String {
        let payload = serde_json::to_vec(claims).expect("claims are always serializable");
        let sig = self.sign(&payload);
        format!("{}.{}", B64.encode(payload), B64.encode(sig))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(CoreError::TokenInvalid)?;
        let payload = B64.decode(payload_b64).map_err(|_| CoreError::TokenInvalid)?;
        let sig = B64.decode(sig_b64).map_err(|_| CoreError::TokenInvalid)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(&payload);
        mac.verify_slice(&sig).map_err(|_| CoreError::TokenInvalid)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| CoreError::TokenInvalid)?;
        if claims.exp < Utc::now().timestamp() {
            return Err(CoreError::TokenExpired);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_hashes_differently() {
        // Random salts: two hashes of the same password must differ.
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("pw", "not-a-hash"));
        assert!(!verify_password("pw", "!!$!!"));
    }

    #[test]
    fn token_round_trip() {
        let signer = TokenSigner::random();
        let token = signer.issue(&user());
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.email, "a@b.c");
    }

    #[test]
    fn tampered_token_rejected() {
        let signer = TokenSigner::random();
        let token = signer.issue(&user());
        let mut tampered = token.clone();
        tampered.replace_range(0..1, if token.starts_with('A') { "B" } else { "A" });
        assert!(matches!(
            signer.verify(&tampered),
            Err(CoreError::TokenInvalid)
        ));
    }

    #[test]
    fn foreign_key_rejected() {
        let token = TokenSigner::random().issue(&user());
        assert!(TokenSigner::random().verify(&token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let signer = TokenSigner::random();
        let claims = Claims {
            user_id: "u1".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            exp: Utc::now().timestamp() - 10,
        };
        let token = signer.issue_claims(&claims);
        assert!(matches!(signer.verify(&token), Err(CoreError::TokenExpired)));
    }

    #[test]
    fn garbage_token_rejected() {
        let signer = TokenSigner::random();
        assert!(signer.verify("no-dot-here").is_err());
        assert!(signer.verify("a.b").is_err());
    }
}
