//! Shared-secret signatures for warehouse callbacks.
//!
//! The warehouse signs the raw request body with HMAC-SHA256 and sends
//! `X-Warehouse-Signature: sha256=<hex digest>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Warehouse-Signature";
const SCHEME_PREFIX: &str = "sha256=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing X-Warehouse-Signature header")]
    Missing,
    #[error("Malformed X-Warehouse-Signature header")]
    Malformed,
    #[error("Signature does not match payload")]
    Mismatch,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    /// Header value a sender should attach to `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(body);
        format!("{SCHEME_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Check `header` against `body` in constant time.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let digest = header
            .trim()
            .strip_prefix(SCHEME_PREFIX)
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac();
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"orderId":"ORD-1-abc","sessionId":"s1","hasStock":true}"#;

    #[test]
    fn accepts_own_signature() {
        let verifier = WebhookVerifier::new("top-secret");
        let header = verifier.sign(BODY);
        assert!(header.starts_with("sha256="));
        assert_eq!(verifier.verify(BODY, Some(&header)), Ok(()));
    }

    #[test]
    fn rejects_signature_from_other_secret() {
        let header = WebhookVerifier::new("other").sign(BODY);
        assert_eq!(
            WebhookVerifier::new("top-secret").verify(BODY, Some(&header)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_modified_body() {
        let verifier = WebhookVerifier::new("top-secret");
        let header = verifier.sign(BODY);
        let tampered = br#"{"orderId":"ORD-1-abc","sessionId":"s1","hasStock":false}"#;
        assert_eq!(
            verifier.verify(tampered, Some(&header)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        let verifier = WebhookVerifier::new("top-secret");
        assert_eq!(verifier.verify(BODY, None), Err(SignatureError::Missing));
        assert_eq!(
            verifier.verify(BODY, Some("md5=abcd")),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verifier.verify(BODY, Some("sha256=not-hex")),
            Err(SignatureError::Malformed)
        );
    }
}
