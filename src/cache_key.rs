// ABOUTME: Deterministic cache key derivation from ordered input fingerprints.
// ABOUTME: Hashes lock file contents and version selectors into a single stable key.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Errors from cache key derivation.
#[derive(Debug, thiserror::Error)]
pub enum CacheKeyError {
    /// No fingerprints were supplied.
    #[error("invalid input: at least one fingerprint is required")]
    InvalidInput,
}

/// One input to a cache key: a content hash or a literal selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of arbitrary content (SHA-256, hex encoded).
    pub fn of_content(content: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(content)))
    }

    /// A version selector such as `node-20` or `rust-1.85`, used verbatim.
    pub fn selector(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fingerprint the contents of `file`, resolved against `root`.
    ///
    /// A missing file fingerprints as `missing:<file>` so that adding the
    /// file later changes the key. Only the relative name goes into the
    /// marker, so two checkouts of the same project agree.
    pub async fn of_file(root: &Path, file: &Path) -> std::io::Result<Self> {
        match tokio::fs::read(root.join(file)).await {
            Ok(content) => Ok(Self::of_content(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self(format!("missing:{}", file.display())))
            }
            Err(e) => Err(e),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A derived cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive a cache key from an ordered list of fingerprints.
///
/// Each fingerprint is length-prefixed before hashing so that
/// `["ab", "c"]` and `["a", "bc"]` produce different keys.
pub fn derive(fingerprints: &[Fingerprint]) -> Result<CacheKey, CacheKeyError> {
    if fingerprints.is_empty() {
        return Err(CacheKeyError::InvalidInput);
    }

    let mut hasher = Sha256::new();
    for fp in fingerprints {
        hasher.update((fp.0.len() as u64).to_be_bytes());
        hasher.update(fp.0.as_bytes());
    }

    Ok(CacheKey(hex::encode(hasher.finalize())))
}
