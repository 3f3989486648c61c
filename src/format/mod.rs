//! Stored-secret envelope format.
//!
//! A stored secret is a single delimited string `version:nonceHex:ciphertextHex`.
//! The leading version field lets the cipher or layout change later without
//! breaking records already at rest.

use crate::error::VaultError;

pub mod v1;

/// Latest envelope version.
pub const CURRENT_VERSION: u8 = v1::VERSION;

/// A parsed stored-secret envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u8,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Wraps freshly produced cipher output at the current version.
    pub fn new(nonce: [u8; crate::crypto::NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            version: CURRENT_VERSION,
            nonce: nonce.to_vec(),
            ciphertext,
        }
    }

    pub(crate) fn from_parts(version: u8, nonce: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self {
            version,
            nonce,
            ciphertext,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Serializes an envelope to its storable string form.
///
/// Dispatches on the envelope's version.
pub fn encode(envelope: &Envelope) -> Result<String, VaultError> {
    match envelope.version {
        v1::VERSION => v1::encode(envelope),
        _ => Err(VaultError::CorruptEnvelope("unsupported version")),
    }
}

/// Parses a stored string back into an envelope.
///
/// Fails with [`VaultError::CorruptEnvelope`] on a wrong field count, bad
/// hex, bad field lengths, or an unrecognized version.
pub fn decode(s: &str) -> Result<Envelope, VaultError> {
    let (version, rest) = s
        .split_once(':')
        .ok_or(VaultError::CorruptEnvelope("missing fields"))?;

    let version: u8 = version
        .parse()
        .map_err(|_| VaultError::CorruptEnvelope("invalid version field"))?;

    match version {
        v1::VERSION => v1::decode(rest),
        _ => Err(VaultError::CorruptEnvelope("unsupported version")),
    }
}
