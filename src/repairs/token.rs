//! API token helpers. Only SHA-256 digests of tokens are ever stored or compared.

use regex::Regex;
use sha2::{Digest, Sha256};

/// Tokens are opaque URL-safe strings between 16 and 128 characters.
pub fn valid_token(token: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_-]{16,128}$").is_ok_and(|re| re.is_match(token))
}

/// Hash a raw token for storage and lookup.
pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Hex form of `hash_token`, used for log fields where the digest prefix helps correlate requests.
pub fn token_fingerprint(token: &str) -> String {
    let digest = hex::encode(hash_token(token));
    digest[..12].to_string()
}
