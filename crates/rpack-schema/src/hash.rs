//! SHA-256 digest newtype used for lockfile entries and commit checksums.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// A validated SHA-256 digest: exactly 64 lowercase hex characters.
///
/// `spec.md` §6.1 requires lockfile `sha` fields to be lowercase hex, and
/// §8 requires byte-identical (not case-normalized) comparison between runs
/// — keeping the digest as a plain lowercase string, rather than raw bytes,
/// makes that comparison a simple `==` with no re-encoding step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// Validate and wrap an existing hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not exactly 64 ASCII hex characters.
    pub fn validated(s: &str) -> Result<Self, String> {
        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(format!(
                "invalid sha256 digest: expected 64 hex chars, got '{s}'"
            ))
        }
    }

    /// Compute the digest of a byte slice.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Compute the digest of a file's full contents.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn compute_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::compute(&data))
    }

    /// The digest as a lowercase hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Hex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::validated(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        let a = Sha256Hex::compute(b"hello");
        let b = Sha256Hex::compute(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn compute_differs_by_input() {
        assert_ne!(Sha256Hex::compute(b"a"), Sha256Hex::compute(b"b"));
    }

    #[test]
    fn validated_rejects_wrong_length() {
        assert!(Sha256Hex::validated("deadbeef").is_err());
    }

    #[test]
    fn validated_rejects_non_hex() {
        let s = "g".repeat(64);
        assert!(Sha256Hex::validated(&s).is_err());
    }

    #[test]
    fn validated_lowercases() {
        let upper = "A".repeat(64);
        let hash = Sha256Hex::validated(&upper).unwrap();
        assert_eq!(hash.as_str(), "a".repeat(64));
    }

    #[test]
    fn compute_file_matches_compute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"staged contents").unwrap();

        let from_file = Sha256Hex::compute_file(&path).unwrap();
        let from_bytes = Sha256Hex::compute(b"staged contents");
        assert_eq!(from_file, from_bytes);
    }
}
