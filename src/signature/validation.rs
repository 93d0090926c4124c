// Fingerprinting and signature validation
// Author: kelexine (https://github.com/kelexine)

use super::MIN_SIGNATURE_LEN;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of the exact bytes of a thinking block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 16 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprint the exact text of a thinking block.
pub fn fingerprint(text: &str) -> Fingerprint {
    let digest = Sha256::digest(text.as_bytes());
    Fingerprint(digest.into())
}

/// Whether `signature` looks like a real provider token.
///
/// The model group is accepted so families can get their own thresholds
/// later; today the rule is the same for all of them.
pub fn is_valid_signature(model_group: &str, signature: &str) -> bool {
    is_valid_signature_with(model_group, signature, MIN_SIGNATURE_LEN)
}

/// Same rule with an explicit minimum length.
pub fn is_valid_signature_with(_model_group: &str, signature: &str, min_len: usize) -> bool {
    !signature.is_empty() && signature.len() >= min_len
}

/// Map a concrete model name onto the group its signatures are scoped to.
pub fn model_group(model: &str) -> String {
    let lower = model.to_ascii_lowercase();
    ["claude", "gemini", "gpt"]
        .iter()
        .find(|family| lower.contains(*family))
        .map(|family| family.to_string())
        .unwrap_or(lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint("thinking..."), fingerprint("thinking..."));
        assert_eq!(
            fingerprint("").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_byte_exact() {
        assert_ne!(fingerprint("Thinking"), fingerprint("thinking"));
        assert_ne!(fingerprint("thinking"), fingerprint("thinking "));
    }

    #[test]
    fn test_signature_length_threshold() {
        assert!(!is_valid_signature("claude", &"a".repeat(49)));
        assert!(is_valid_signature("claude", &"a".repeat(50)));
        assert!(is_valid_signature("gemini", &"a".repeat(50)));
        assert!(!is_valid_signature("gemini", ""));
    }

    #[test]
    fn test_explicit_threshold() {
        assert!(is_valid_signature_with("claude", "12345678", 8));
        assert!(!is_valid_signature_with("claude", "1234567", 8));
        assert!(!is_valid_signature_with("claude", "", 0));
    }

    #[test]
    fn test_model_group() {
        assert_eq!(model_group("claude-sonnet-4-5-20250929"), "claude");
        assert_eq!(model_group("gemini-3-pro-preview"), "gemini");
        assert_eq!(model_group("GPT-5-codex"), "gpt");
        assert_eq!(model_group("Qwen3-Coder"), "qwen3-coder");
    }
}
