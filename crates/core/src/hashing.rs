//! SHA-256 helpers for artifact integrity checks.

use sha2::{Digest, Sha256};

use crate::error::DomainError;

/// Hex-encoded SHA-256 digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Verify uploaded artifact bytes against the declared size and hash.
///
/// Must be called before any row is written; a mismatch rejects the
/// whole upload.
pub fn verify_artifact(data: &[u8], bytesize: i64, hash: &str) -> Result<(), DomainError> {
    if data.len() as i64 != bytesize {
        return Err(DomainError::Validation("Bytesize does not match".into()));
    }
    if sha256_hex(data) != hash.to_lowercase() {
        return Err(DomainError::Validation(
            "SHA-256 hash does not match".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // sha256("hello") -- well-known vector.
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn valid_artifact_passes() {
        assert!(verify_artifact(b"hello", 5, HELLO_SHA256).is_ok());
    }

    #[test]
    fn hash_comparison_is_case_insensitive() {
        let upper = HELLO_SHA256.to_uppercase();
        assert!(verify_artifact(b"hello", 5, &upper).is_ok());
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = verify_artifact(b"hello", 4, HELLO_SHA256);
        assert_matches!(err, Err(DomainError::Validation(msg)) if msg.contains("Bytesize"));
    }

    #[test]
    fn hash_mismatch_is_rejected() {
        let err = verify_artifact(b"hello!", 6, HELLO_SHA256);
        assert_matches!(err, Err(DomainError::Validation(msg)) if msg.contains("SHA-256"));
    }
}
