use sha2::{Digest, Sha256};

use crate::error::{AuditError, AuditResult};

/// The length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LENGTH: usize = 64;

/// Known-answer vector used by [`self_check`].
const SELF_CHECK_WORD: &str = "password123";
const SELF_CHECK_DIGEST: &str = "ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f";

/// A reusable SHA-256 hashing context.
///
/// Each worker owns one digester for the whole run, so the hot loops never
/// reallocate hashing state. The context is reset after every digest and must
/// never be shared between two in-flight computations.
pub struct HexDigester {
    hasher: Sha256,
}

impl HexDigester {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Digests a word into a 64-character lowercase hex string.
    pub fn digest_hex(&mut self, word: &str) -> String {
        self.hasher.update(word.as_bytes());
        hex::encode(self.hasher.finalize_reset())
    }
}

impl Default for HexDigester {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a known-answer test on the digest primitive.
///
/// A mismatch means the build is miscompiled or corrupted. Callers should
/// abort before loading any input, as every later result would be garbage.
pub fn self_check() -> AuditResult<()> {
    let actual = HexDigester::new().digest_hex(SELF_CHECK_WORD);

    if actual != SELF_CHECK_DIGEST {
        return Err(AuditError::SelfCheck(actual));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let mut digester = HexDigester::new();

        assert_eq!(
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8",
            digester.digest_hex("password")
        );
        assert_eq!(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            digester.digest_hex("")
        );
    }

    #[test]
    fn test_digest_shape() {
        let digest = HexDigester::new().digest_hex("hunter2");

        assert_eq!(DIGEST_HEX_LENGTH, digest.len());
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_context_reuse_matches_one_shot() {
        let mut reused = HexDigester::new();
        let first = reused.digest_hex("letmein");
        let second = reused.digest_hex("letmein");

        assert_eq!(first, second);
        assert_eq!(first, HexDigester::new().digest_hex("letmein"));
    }

    #[test]
    fn test_self_check_passes() {
        self_check().unwrap();
    }
}
