use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::canonicalizer::{CanonicalizationError, Canonicalizer};
use crate::validation::ValidationError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlg {
    /// SHA-256 (the only algorithm Rollcall emits).
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    pub b64: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        let b64 = b64.into();
        let re = Regex::new(r"^[A-Za-z0-9_-]{43}$").expect("invalid regex");
        if !re.is_match(&b64) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }

    /// Hashes `domain || bytes` with SHA-256.
    pub fn sha256(domain: &[u8], bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(bytes);
        let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize());
        Digest {
            alg: DigestAlg::Sha256,
            b64,
        }
    }
}

/// Error during digest computation.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// Canonicalization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Computes `sha256(domain || canonical_bytes(value))`.
///
/// Domain separators keep digests of different record kinds from colliding,
/// e.g. a credential digest can never be replayed as an audit digest.
pub fn compute_digest<T: Serialize>(
    domain: &[u8],
    value: &T,
    canonicalizer: &Canonicalizer,
) -> Result<Digest, DigestError> {
    let bytes = canonicalizer.canonicalize_serializable(value)?;
    Ok(Digest::sha256(domain, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn domain_separates_digests() {
        let c = Canonicalizer::default();
        let value = json!({"eventId": "evt-1"});
        let a = compute_digest(b"rollcall:a:v1\0", &value, &c).unwrap();
        let b = compute_digest(b"rollcall:b:v1\0", &value, &c).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn sha256_output_passes_validation() {
        let d = Digest::sha256(b"x", b"y");
        assert!(Digest::new(d.alg, d.b64.clone()).is_ok());
    }

    #[test]
    fn rejects_short_digest() {
        assert!(Digest::new(DigestAlg::Sha256, "abc").is_err());
    }
}
