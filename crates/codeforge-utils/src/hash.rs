//! Content hashing
//!
//! All caching in the pipeline keys on blake3 hashes of canonical content.

/// Computes the blake3 hash of content, returned as a lowercase hex string.
#[must_use]
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
