//! Short, loggable fingerprint of the session signing key.
//!
//! Operators compare fingerprints across replicas to confirm they share a key
//! without the key material leaving the process.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

const FINGERPRINT_BYTES: usize = 8;

/// Hex of the first 8 bytes of `SHA-256(signing key)`.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use budget_portal::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
