use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

use super::{KEY_LEN, NONCE_LEN, TAG_LEN, secure_random};
use crate::error::VaultError;

fn check_key(key: &[u8]) -> Result<(), VaultError> {
    if key.len() != KEY_LEN {
        return Err(VaultError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Ok(())
}

/// Encrypt plaintext under a derived key with a fresh random nonce.
///
/// The ciphertext carries a 16-byte Poly1305 tag; nonce reuse across calls
/// is prevented by drawing every nonce from the OS CSPRNG.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), VaultError> {
    check_key(key)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| VaultError::EncryptionFailure)?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext, verifying the authentication tag.
///
/// A tag mismatch means the wrong key (wrong master password) or tampered
/// data; it never yields garbage plaintext.
pub fn decrypt(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    check_key(key)?;
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::MalformedInput("nonce length"));
    }
    if ciphertext.len() < TAG_LEN {
        return Err(VaultError::MalformedInput("ciphertext shorter than tag"));
    }

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::AuthenticationFailure)?;
    Ok(Zeroizing::new(plaintext))
}
