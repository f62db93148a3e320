//! Webhook signature verification.
//!
//! The chat platform signs every webhook body with HMAC-SHA256 keyed by the
//! application secret and sends the lowercase hex digest in `x-signature`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Webhook verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("missing x-signature header")]
    MissingSignature,

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("webhook secret is unusable: {0}")]
    InvalidSecret(String),
}

/// Verifies webhook bodies against the application secret.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Hex digest of `body` under the application secret.
    pub fn sign(&self, body: &[u8]) -> Result<String, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        mac.update(body);
        Ok(hex_encode(&mac.finalize().into_bytes()))
    }

    /// Checks `signature` (hex, case-insensitive) in constant time.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let provided = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?
            .to_ascii_lowercase();
        let expected = self.sign(body)?;

        if expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() != 1 {
            tracing::warn!(body_len = body.len(), "Invalid webhook signature");
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }
}

/// Encode bytes as lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::new("stream-secret".to_string()))
    }

    #[test]
    fn hex_encode_bytes() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(hex_encode(&[]), "");
    }

    #[test]
    fn signature_is_sha256_hex() {
        let signature = verifier().sign(b"{}").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"type":"ai_indicator.stop","message_id":"m1"}"#;
        let signature = verifier().sign(body).unwrap();
        assert!(verifier().verify(body, Some(&signature)).is_ok());
    }

    #[test]
    fn uppercase_signature_passes() {
        let body = b"payload";
        let signature = verifier().sign(body).unwrap().to_uppercase();
        assert!(verifier().verify(body, Some(&signature)).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let signature = verifier().sign(b"original").unwrap();
        assert_eq!(
            verifier().verify(b"tampered", Some(&signature)),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn other_secret_fails() {
        let other = WebhookVerifier::new(SecretString::new("other".to_string()));
        let signature = other.sign(b"payload").unwrap();
        assert_eq!(
            verifier().verify(b"payload", Some(&signature)),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn missing_signature_fails() {
        assert_eq!(
            verifier().verify(b"payload", None),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            verifier().verify(b"payload", Some("  ")),
            Err(WebhookError::MissingSignature)
        );
    }
}
