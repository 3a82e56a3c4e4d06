//! Content fingerprints for versioned asset file names.

/// Number of hash bytes kept in a fingerprint (8 hex characters).
const FINGERPRINT_BYTES: usize = 4;

/// Short, stable fingerprint of some content, e.g. `1a2b3c4d`.
pub fn fingerprint(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    hex::encode(&hash.as_bytes()[..FINGERPRINT_BYTES])
}
