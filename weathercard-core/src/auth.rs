//! Shared-secret request signatures.
//!
//! The caller signs the raw request body with HMAC-SHA256 and sends
//! `Authorization: HMAC <base64 digest>`.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Scheme label that prefixes every signature header.
pub const SCHEME: &str = "HMAC ";

/// Why a request was not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeader,
    EmptyBody,
    MalformedHeader,
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Rejected(RejectReason),
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Pre-shared signing key. Opaque bytes, configured as base64.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    pub fn new(key: Vec<u8>) -> Result<Self, AuthError> {
        if key.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(&key).map_err(|_| AuthError::EmptySecret)?;
        Ok(Self { mac })
    }

    pub fn from_base64(secret: &str) -> Result<Self, AuthError> {
        Self::new(STANDARD.decode(secret.trim())?)
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }

    /// Full `Authorization` header value for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(body);
        format!("{SCHEME}{}", STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Check a claimed header against `body`.
    ///
    /// Accepts exactly the headers equal to [`SigningKey::sign`], but compares
    /// digests in constant time. The strict standard engine rejects every
    /// non-canonical encoding, so decoding does not widen the accepted set.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Verification {
        let verification = self.check(header, body);
        if let Verification::Rejected(reason) = verification {
            tracing::debug!(?reason, "request signature rejected");
        }
        verification
    }

    fn check(&self, header: Option<&str>, body: &[u8]) -> Verification {
        let Some(header) = header.filter(|h| !h.is_empty()) else {
            return Verification::Rejected(RejectReason::MissingHeader);
        };
        if body.is_empty() {
            return Verification::Rejected(RejectReason::EmptyBody);
        }

        let Some(encoded) = header.strip_prefix(SCHEME) else {
            return Verification::Rejected(RejectReason::MalformedHeader);
        };
        let Ok(claimed) = STANDARD.decode(encoded) else {
            return Verification::Rejected(RejectReason::MalformedHeader);
        };

        let mut mac = self.mac();
        mac.update(body);
        match mac.verify_slice(&claimed) {
            Ok(()) => Verification::Verified,
            Err(_) => Verification::Rejected(RejectReason::Mismatch),
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").field("key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c2VjcmV0LXRlYW1zLXRva2VuLWZvci10ZXN0cw==";
    const BODY: &[u8] = br#"{"type":"message","text":"<at>WeatherBot</at>&nbsp;Seattle"}"#;

    fn key() -> SigningKey {
        SigningKey::from_base64(SECRET).expect("valid secret")
    }

    #[test]
    fn signature_has_scheme_prefix() {
        let header = key().sign(BODY);
        assert!(header.starts_with("HMAC "));
        // 32-byte digest -> 44 base64 characters.
        assert_eq!(header.len(), SCHEME.len() + 44);
    }

    #[test]
    fn sign_is_deterministic() {
        assert_eq!(key().sign(BODY), key().sign(BODY));
    }

    #[test]
    fn matching_signature_verifies() {
        let header = key().sign(BODY);
        assert_eq!(key().verify(Some(&header), BODY), Verification::Verified);
    }

    #[test]
    fn known_digest() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let key = SigningKey::new(b"key".to_vec()).expect("non-empty key");
        let header = key.sign(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(header, "HMAC 97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn any_body_byte_mutation_is_rejected() {
        let key = key();
        let header = key.sign(BODY);

        for i in 0..BODY.len() {
            let mut tampered = BODY.to_vec();
            tampered[i] ^= 0x01;
            assert_eq!(
                key.verify(Some(&header), &tampered),
                Verification::Rejected(RejectReason::Mismatch),
                "mutation at byte {i} must not verify"
            );
        }
    }

    #[test]
    fn any_key_byte_mutation_is_rejected() {
        let original = STANDARD.decode(SECRET).expect("valid base64");
        let header = key().sign(BODY);

        for i in 0..original.len() {
            let mut mutated = original.clone();
            mutated[i] ^= 0x80;
            let other = SigningKey::new(mutated).expect("non-empty key");
            assert!(!other.verify(Some(&header), BODY).is_verified());
        }
    }

    #[test]
    fn missing_header_or_body_is_rejected() {
        let key = key();
        let header = key.sign(BODY);

        assert_eq!(
            key.verify(None, BODY),
            Verification::Rejected(RejectReason::MissingHeader)
        );
        assert_eq!(
            key.verify(Some(""), BODY),
            Verification::Rejected(RejectReason::MissingHeader)
        );
        assert_eq!(
            key.verify(Some(&header), b""),
            Verification::Rejected(RejectReason::EmptyBody)
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let key = key();
        let header = key.sign(BODY);
        let digest = header.trim_start_matches(SCHEME);

        for bad in [
            digest.to_string(),
            format!("Bearer {digest}"),
            format!("hmac {digest}"),
            format!("HMAC  {digest}"),
            format!("HMAC {}", digest.trim_end_matches('=')),
            "HMAC not*base64".to_string(),
        ] {
            assert!(!key.verify(Some(&bad), BODY).is_verified(), "{bad} must not verify");
        }
    }

    #[test]
    fn invalid_secrets_are_config_errors() {
        assert!(matches!(
            SigningKey::from_base64("***"),
            Err(AuthError::InvalidSecret(_))
        ));
        assert!(matches!(SigningKey::from_base64(""), Err(AuthError::EmptySecret)));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", key());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("redacted"));
    }
}
