//! CSRF (Cross-Site Request Forgery) token service
//!
//! Stateless token scheme: a token is a random salt plus an HMAC-SHA256 tag
//! over that salt, keyed by a process-wide secret created lazily on first
//! use. Tokens verify against whatever secret is active at verification
//! time, so a process restart invalidates every outstanding token.

use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

/// CSRF service for generating and verifying tokens
// Intentionally no Debug derive so the secret cannot leak into logs.
#[derive(Default)]
pub struct CsrfTokens {
    secret: OnceLock<[u8; SECRET_BYTES]>,
}

impl CsrfTokens {
    pub fn new() -> Self {
        Self {
            secret: OnceLock::new(),
        }
    }

    /// The signing secret, created on first use
    fn secret(&self) -> &[u8; SECRET_BYTES] {
        self.secret.get_or_init(|| {
            let mut bytes = [0u8; SECRET_BYTES];
            rand::rng().fill_bytes(&mut bytes);
            bytes
        })
    }

    /// Generate a new token: `{base64url(salt)}.{base64url(hmac(secret, salt))}`
    ///
    /// Tokens are opaque to clients and URL-safe.
    pub fn generate_token(&self) -> String {
        let mut salt = [0u8; SALT_BYTES];
        rand::rng().fill_bytes(&mut salt);
        let tag = self.tag(&salt).unwrap_or_default();
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    /// Verify a candidate token against the active secret.
    ///
    /// Never fails loudly: malformed shape, bad base64, wrong salt length,
    /// and wrong tag all return `false`. Tag comparison is constant-time.
    pub fn verify_token(&self, candidate: &str) -> bool {
        let Some((salt_text, tag_text)) = candidate.split_once('.') else {
            return false;
        };
        let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_text) else {
            return false;
        };
        let Ok(tag) = URL_SAFE_NO_PAD.decode(tag_text) else {
            return false;
        };
        if salt.len() != SALT_BYTES {
            return false;
        }
        let Some(expected) = self.tag(&salt) else {
            return false;
        };
        if tag.len() != expected.len() {
            return false;
        }
        tag.ct_eq(&expected).into()
    }

    fn tag(&self, salt: &[u8]) -> Option<Vec<u8>> {
        // HMAC-SHA256 accepts keys of any length, so this cannot fail for
        // the fixed-size secret; the fallback keeps the path panic-free.
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret()) else {
            return None;
        };
        mac.update(salt);
        Some(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_issued_token() {
        let service = CsrfTokens::new();
        let token = service.generate_token();

        assert!(service.verify_token(&token));
        // Verification is repeatable; tokens are not single-use.
        assert!(service.verify_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let service = CsrfTokens::new();
        assert_ne!(service.generate_token(), service.generate_token());
    }

    #[test]
    fn test_fresh_instance_invalidates_outstanding_tokens() {
        let old_service = CsrfTokens::new();
        let token = old_service.generate_token();

        // A new instance models a process restart with a new lazy secret.
        let new_service = CsrfTokens::new();
        assert!(!new_service.verify_token(&token));
        assert!(old_service.verify_token(&token));
    }

    #[test]
    fn test_malformed_tokens_verify_false() {
        let service = CsrfTokens::new();

        assert!(!service.verify_token(""));
        assert!(!service.verify_token("no-separator"));
        assert!(!service.verify_token("."));
        assert!(!service.verify_token("!!!.???"));
        assert!(!service.verify_token("c2FsdA.c2FsdA.c2FsdA"));

        // Valid base64 but wrong salt length.
        assert!(!service.verify_token("c2FsdA.c2FsdA"));
    }

    #[test]
    fn test_tampered_token_verifies_false() {
        let service = CsrfTokens::new();
        let token = service.generate_token();

        let mut tampered = token.clone();
        let replacement = if token.starts_with('A') { "B" } else { "A" };
        tampered.replace_range(0..1, replacement);

        assert!(!service.verify_token(&tampered));
    }

    #[test]
    fn test_token_is_url_safe() {
        let service = CsrfTokens::new();

        for _ in 0..100 {
            let token = service.generate_token();
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            );
            assert!(!token.contains('='));
        }
    }
}
