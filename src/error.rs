use thiserror::Error;

/// Errors surfaced by the vault engine.
///
/// None of these variants ever carry a password, a key, or a decrypted
/// secret; callers may log them freely.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Password rejected by the strength policy. Carries the advisory
    /// feedback so the caller can show the user what to fix.
    #[error("password rejected by strength policy: {0}")]
    WeakInput(String),

    /// A persisted hex field (salt) could not be decoded.
    #[error("invalid {0} encoding")]
    InvalidEncoding(&'static str),

    /// A raw input (nonce, ciphertext, generator options) has an invalid shape.
    #[error("malformed input: {0}")]
    MalformedInput(&'static str),

    /// A stored secret string does not parse as a known envelope format.
    #[error("corrupt secret envelope: {0}")]
    CorruptEnvelope(&'static str),

    /// The authentication tag did not verify: wrong key or tampered data.
    #[error("authentication failed: wrong key or tampered data")]
    AuthenticationFailure,

    /// Operation requires an unlocked vault.
    #[error("vault is locked")]
    VaultLocked,

    /// Key is not the canonical derived length. Indicates a bug in the
    /// caller, not a user-recoverable condition.
    #[error("encryption key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(&'static str),

    #[error("key derivation failed")]
    KdfFailure,

    #[error("encryption failed")]
    EncryptionFailure,

    #[error("OS random generator unavailable")]
    EntropyUnavailable,
}

/// Errors from the in-memory item store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item '{0}' already exists")]
    ItemAlreadyExists(String),

    #[error("item '{0}' not found")]
    ItemNotFound(String),

    #[error("failed to serialize store")]
    Serialize(#[from] serde_json::Error),
}
