//! Crypto-random key generation for the temporary secret store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Entropy of a temporary secret key, in bytes.
pub const TOKEN_BYTES: usize = 16;

/// Generate a URL-safe random token of `len` bytes of entropy, encoded
/// as unpadded base64url.
///
/// Uses the operating system's CSPRNG; the result is not guessable.
#[must_use]
pub fn url_safe_token(len: usize) -> String {
    let mut bytes = vec![0u8; len.max(1)];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(&bytes)
}
