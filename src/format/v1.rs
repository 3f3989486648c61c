//! Envelope format v1.
//!
//! ```text
//! 1:<nonce hex, 48 chars>:<ciphertext hex, >= 32 chars>
//! ```
//!
//! The nonce is the 24-byte XChaCha20-Poly1305 nonce; the ciphertext
//! includes the 16-byte authentication tag.

use super::Envelope;
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::VaultError;

/// Version tag of this layout.
pub const VERSION: u8 = 1;

/// Serializes an envelope to the v1 string form.
pub fn encode(envelope: &Envelope) -> Result<String, VaultError> {
    if envelope.nonce().len() != NONCE_LEN {
        return Err(VaultError::CorruptEnvelope("invalid nonce length for v1"));
    }
    if envelope.ciphertext().len() < TAG_LEN {
        return Err(VaultError::CorruptEnvelope(
            "invalid ciphertext length for v1",
        ));
    }

    Ok(format!(
        "{VERSION}:{}:{}",
        hex::encode(envelope.nonce()),
        hex::encode(envelope.ciphertext())
    ))
}

/// Parses the fields after the version tag of a v1 string.
pub fn decode(fields: &str) -> Result<Envelope, VaultError> {
    let (nonce_hex, ciphertext_hex) = fields
        .split_once(':')
        .ok_or(VaultError::CorruptEnvelope("missing fields"))?;

    if ciphertext_hex.contains(':') {
        return Err(VaultError::CorruptEnvelope("too many fields"));
    }

    let nonce = hex::decode(nonce_hex).map_err(|_| VaultError::CorruptEnvelope("nonce hex"))?;
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::CorruptEnvelope("invalid nonce length for v1"));
    }

    let ciphertext =
        hex::decode(ciphertext_hex).map_err(|_| VaultError::CorruptEnvelope("ciphertext hex"))?;
    if ciphertext.len() < TAG_LEN {
        return Err(VaultError::CorruptEnvelope(
            "invalid ciphertext length for v1",
        ));
    }

    Ok(Envelope::from_parts(VERSION, nonce, ciphertext))
}
