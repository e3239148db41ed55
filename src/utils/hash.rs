//! Short content digests used as cache key segments.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
pub const DIGEST_LEN: usize = 16;

/// Truncated hex SHA-256 of `input`.
pub fn short_digest(input: &[u8]) -> String {
    let mut hex = hex::encode(Sha256::digest(input));
    hex.truncate(DIGEST_LEN);
    hex
}

/// Digest of a value's JSON form.
///
/// `serde_json` keeps struct field order, so equal values hash equally.
pub fn json_digest<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(short_digest(&bytes))
}
