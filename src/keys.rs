//! API key material generation and hashing.
//!
//! Issued keys carry a fixed namespace prefix followed by 32 random bytes in
//! hex. Only the SHA-256 digest of a key is ever persisted; verification
//! recomputes the digest and performs an indexed lookup.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Namespace prefix on every issued key. Changing this invalidates nothing
/// server-side (only digests are stored) but breaks client-side recognition.
pub const API_KEY_PREFIX: &str = "rl_ak_";

/// Generate a fresh plaintext API key with 256 bits of entropy.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

/// Deterministic one-way digest of a plaintext key, hex-encoded.
pub fn hash_api_key(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}
