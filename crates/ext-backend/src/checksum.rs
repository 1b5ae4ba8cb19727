//! SHA-256 content hashes in the canonical `sha256:<hex>` format.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the canonical checksum of a byte buffer.
pub fn content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}
