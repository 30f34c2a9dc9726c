use crate::error::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Trait for verifying webhook payload signatures.
///
/// The payment provider signs each delivery with a shared secret; the
/// verifier decides whether a presented signature matches the raw payload.
/// Verification never errors on malformed input - a signature that cannot
/// be decoded simply fails verification.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Returns `Ok(true)` if the signature is valid for the payload.
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool>;
}

/// No-op verifier used when no signing secret is configured.
///
/// This is a deliberate deployment policy (some providers cannot sign their
/// callbacks), not a recommended default. Every accepted delivery is logged
/// at warn level so an unsigned production deployment is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

#[async_trait]
impl SignatureVerifier for NoVerification {
    async fn verify_signature(&self, _payload: &[u8], _signature: &str) -> Result<bool> {
        tracing::warn!("no webhook secret configured - accepting delivery without verification");
        Ok(true)
    }
}

/// HMAC-SHA256 verifier with timing-safe comparison.
///
/// The provider sends the signature hex encoded. The expected value is the
/// keyed hash of the raw request body, compared with [`constant_time_compare`]
/// so invalid signatures cannot be guessed byte-by-byte through timing.
pub struct HmacSha256Verifier {
    secret: Vec<u8>,
}

impl HmacSha256Verifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn compute_signature(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[async_trait]
impl SignatureVerifier for HmacSha256Verifier {
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let provided = match hex_decode(signature) {
            Some(bytes) => bytes,
            None => {
                tracing::debug!("failed to decode webhook signature");
                return Ok(false);
            }
        };

        let expected = self.compute_signature(payload);
        let is_valid = constant_time_compare(&expected, &provided);

        if !is_valid {
            tracing::debug!("webhook signature verification failed");
        }

        Ok(is_valid)
    }
}

/// Decode a hex string to bytes.
pub(crate) fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() || s.len() % 2 != 0 {
        return None;
    }

    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Constant-time comparison to prevent timing attacks.
///
/// Uses the `subtle` crate, which carries optimization barriers so LLVM
/// cannot turn the bitwise comparison back into an early-exit branch.
/// Differing lengths fail immediately; length is not secret here (both the
/// expected MAC length and the configured API key length are fixed by the
/// deployment, not attacker-controlled).
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute_test_signature(secret: &[u8], payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    #[test]
    fn test_hex_decode_valid() {
        assert_eq!(hex_decode("00"), Some(vec![0x00]));
        assert_eq!(hex_decode("ff"), Some(vec![0xff]));
        assert_eq!(hex_decode("0a1b2c"), Some(vec![0x0a, 0x1b, 0x2c]));
        assert_eq!(hex_decode("AABB"), Some(vec![0xaa, 0xbb]));
    }

    #[test]
    fn test_hex_decode_invalid() {
        assert_eq!(hex_decode(""), None);
        assert_eq!(hex_decode("0"), None); // odd length
        assert_eq!(hex_decode("0g"), None); // invalid char
        assert_eq!(hex_decode("xyz"), None);
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare(&[], &[]));
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(constant_time_compare(&[0xff; 32], &[0xff; 32]));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare(&[1], &[2]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2], &[1, 2, 3]));
        assert!(!constant_time_compare(&[], &[1]));
    }

    #[tokio::test]
    async fn test_no_verification_accepts_everything() {
        let verifier = NoVerification;
        assert!(verifier.verify_signature(b"payload", "sig").await.unwrap());
        assert!(verifier.verify_signature(b"", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_valid_signature_passes() {
        let secret = b"donation-webhook-secret";
        let payload = br#"{"donor_name":"Alice","amount":500}"#;
        let verifier = HmacSha256Verifier::new(secret.to_vec());

        let signature = compute_test_signature(secret, payload);
        assert!(verifier.verify_signature(payload, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_signature_fails() {
        let verifier = HmacSha256Verifier::new("secret");
        let wrong = "0000000000000000000000000000000000000000000000000000000000000000";
        assert!(!verifier.verify_signature(b"payload", wrong).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_secret_fails() {
        let payload = b"payload";
        let signature = compute_test_signature(b"secret1", payload);

        let verifier = HmacSha256Verifier::new("secret2");
        assert!(!verifier.verify_signature(payload, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_modified_payload_fails() {
        let secret = b"secret";
        let signature = compute_test_signature(secret, b"original");

        let verifier = HmacSha256Verifier::new(secret.to_vec());
        assert!(!verifier.verify_signature(b"modified", &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_or_malformed_signature_fails_without_error() {
        let verifier = HmacSha256Verifier::new("secret");

        for sig in ["", "not-hex", "abc", "0g0g0g"] {
            let result = verifier.verify_signature(b"payload", sig).await;
            assert!(result.is_ok());
            assert!(!result.unwrap(), "signature '{}' should fail", sig);
        }
    }
}
