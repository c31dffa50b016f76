use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Short fingerprint for text-like inputs: first 16 hex chars of SHA-256.
pub fn text_fingerprint(text: &str) -> String {
    let mut full = sha256_hex(text.as_bytes());
    full.truncate(16);
    full
}

/// Exact-bytes fingerprint for images. Re-encoded copies do not collide.
pub fn image_fingerprint(bytes: &[u8]) -> String {
    sha256_hex(bytes)
}
