//! Cryptographic primitives for the vault engine.
//!
//! Provides key derivation, authenticated encryption, and salt handling.

pub mod aead;
pub mod kdf;

pub use aead::{decrypt, encrypt};
pub use kdf::{KdfParams, derive, derive_with_salt, rederive};

use crate::error::VaultError;

/// Length of the key derivation salt (32 bytes, 64 hex chars persisted).
pub const SALT_LEN: usize = 32;
/// Length of the nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the Poly1305 authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<(), VaultError> {
    getrandom::fill(buf).map_err(|_| VaultError::EntropyUnavailable)
}

/// Generate a fresh random salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], VaultError> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Hex form of a salt as persisted by the external user store.
pub fn salt_to_hex(salt: &[u8; SALT_LEN]) -> String {
    hex::encode(salt)
}

/// Decode a persisted salt. Fails if the string is not valid hex of
/// exactly [`SALT_LEN`] bytes.
pub fn salt_from_hex(salt_hex: &str) -> Result<[u8; SALT_LEN], VaultError> {
    let bytes = hex::decode(salt_hex).map_err(|_| VaultError::InvalidEncoding("salt"))?;
    bytes
        .try_into()
        .map_err(|_| VaultError::InvalidEncoding("salt"))
}

/// Equality over key material without an early exit on the first
/// mismatching byte.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
