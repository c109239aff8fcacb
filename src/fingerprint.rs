//! Content fingerprint used as the message deduplication key.
//!
//! The digest is SHA-256 over the raw UTF-8 bytes, hex encoded. No
//! normalisation is applied: byte-identical text always maps to the same
//! fingerprint and anything else is treated as different content.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded digest of a message's text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

impl Fingerprint {
    /// Compute the fingerprint of `text`.
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wrap a fingerprint previously read back from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
