//! Loggable identifier for the loaded cookie key.
//!
//! Session cookies are private (encrypted and signed), so the fingerprint
//! covers the full master key. Nodes sharing a key file log the same value.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

const PREFIX: &str = "sk_";
const DIGEST_BYTES: usize = 8;

/// `sk_` followed by 16 lowercase hex digits.
///
/// ```rust
/// use actix_web::cookie::Key;
/// use estate_backend::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert!(fp.starts_with("sk_"));
/// assert_eq!(fp.len(), 19);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.master());
    format!("{PREFIX}{}", hex::encode(&digest[..DIGEST_BYTES]))
}
