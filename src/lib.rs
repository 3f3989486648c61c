mod crypto;
mod error;
pub mod format;
mod generate;
mod store;
mod strength;

pub use crate::crypto::{
    KEY_LEN, KdfParams, NONCE_LEN, SALT_LEN, generate_salt, salt_from_hex, salt_to_hex,
};
pub use crate::error::{StoreError, VaultError};
pub use crate::format::Envelope;
pub use crate::generate::{GenerateOptions, generate};
pub use crate::store::{ItemEntry, ItemStore};
pub use crate::strength::{StrengthPolicy, StrengthVerdict, score};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use zeroize::Zeroize;

use crate::crypto::constant_time_eq;

/// Per-session vault: owns one user's derived key material and mediates all
/// encryption and decryption of stored secrets.
///
/// The raw key never leaves this type. Persistence of the salt and of the
/// encrypted strings is the caller's concern; the vault itself performs no
/// I/O. `encrypt_secret`/`decrypt_secret` may run concurrently; `rotate` and
/// `lock` take exclusive access and block them for their duration.
pub struct Vault {
    state: RwLock<State>,
    kdf: KdfParams,
    policy: StrengthPolicy,
}

enum State {
    Locked,
    Unlocked(MasterKeyMaterial),
}

/// Derived key plus the salt it was derived under. Held only in memory,
/// zeroed on drop.
struct MasterKeyMaterial {
    key: [u8; KEY_LEN],
    salt: [u8; SALT_LEN],
}

impl Drop for MasterKeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.salt.zeroize();
    }
}

/// Re-encryption handle passed to the rotation callback.
///
/// Lets the item-store collaborator move every stored secret from the old
/// key to the new one without seeing either.
pub struct Rekeyer<'a> {
    old_key: &'a [u8; KEY_LEN],
    new_key: &'a [u8; KEY_LEN],
}

impl Rekeyer<'_> {
    /// Decrypts `stored` under the outgoing key and returns it re-encrypted
    /// under the incoming one.
    pub fn reencrypt(&self, stored: &str) -> Result<String, VaultError> {
        let envelope = format::decode(stored)?;
        let plaintext = crypto::decrypt(self.old_key, envelope.nonce(), envelope.ciphertext())?;
        let (ciphertext, nonce) = crypto::encrypt(self.new_key, &plaintext)?;
        format::encode(&Envelope::new(nonce, ciphertext))
    }
}

impl Vault {
    pub fn new() -> Self {
        Self::with_config(KdfParams::default(), StrengthPolicy::default())
    }

    pub fn with_config(kdf: KdfParams, policy: StrengthPolicy) -> Self {
        Self {
            state: RwLock::new(State::Locked),
            kdf,
            policy,
        }
    }

    /// Sets a master password for a new user: strength-gates it, derives a
    /// fresh key and salt, and unlocks the vault.
    ///
    /// Returns the salt in hex for the external user store to persist; the
    /// derived key stays inside the vault. `context` carries related strings
    /// (username, email) the password must not resemble.
    pub fn register(&self, master_password: &str, context: &[&str]) -> Result<String, VaultError> {
        self.policy.check(master_password, context)?;
        let (key, salt) = crypto::derive(master_password, self.kdf)?;

        *self.write_state() = State::Unlocked(MasterKeyMaterial { key, salt });
        Ok(salt_to_hex(&salt))
    }

    /// Re-derives the key from the master password and the persisted salt.
    ///
    /// Whether the password is correct is the external auth layer's check;
    /// a wrong one yields a key that fails with
    /// [`VaultError::AuthenticationFailure`] on first decrypt.
    pub fn unlock(&self, master_password: &str, salt_hex: &str) -> Result<(), VaultError> {
        let salt = salt_from_hex(salt_hex)?;
        let key = crypto::derive_with_salt(master_password, &salt, self.kdf)?;

        *self.write_state() = State::Unlocked(MasterKeyMaterial { key, salt });
        Ok(())
    }

    /// Drops the key material, zeroing it.
    pub fn lock(&self) {
        *self.write_state() = State::Locked;
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(&*self.read_state(), State::Unlocked(_))
    }

    /// Encrypts a plaintext secret into its storable string form.
    pub fn encrypt_secret(&self, plaintext: &[u8]) -> Result<String, VaultError> {
        let guard = self.read_state();
        let State::Unlocked(material) = &*guard else {
            return Err(VaultError::VaultLocked);
        };

        let (ciphertext, nonce) = crypto::encrypt(&material.key, plaintext)?;
        format::encode(&Envelope::new(nonce, ciphertext))
    }

    /// Decrypts a stored string back into the plaintext secret.
    pub fn decrypt_secret(&self, stored: &str) -> Result<zeroize::Zeroizing<Vec<u8>>, VaultError> {
        let guard = self.read_state();
        let State::Unlocked(material) = &*guard else {
            return Err(VaultError::VaultLocked);
        };

        let envelope = format::decode(stored)?;
        crypto::decrypt(&material.key, envelope.nonce(), envelope.ciphertext())
    }

    /// Changes the master password, re-encrypting every stored secret.
    ///
    /// `reencrypt_all` is supplied by the item-store collaborator; it must
    /// pass each stored string through [`Rekeyer::reencrypt`] and commit the
    /// results transactionally. If it returns an error the rotation aborts
    /// and the vault stays unlocked under the old key with nothing changed.
    /// On success the vault holds the new key and the new salt's hex form is
    /// returned for persistence.
    ///
    /// Holds exclusive access for the whole rotation, so concurrent
    /// `encrypt_secret`/`decrypt_secret` calls queue rather than observing a
    /// half-rotated key.
    pub fn rotate<F>(
        &self,
        old_master_password: &str,
        new_master_password: &str,
        reencrypt_all: F,
    ) -> Result<String, VaultError>
    where
        F: FnOnce(&Rekeyer<'_>) -> Result<(), VaultError>,
    {
        let mut guard = self.write_state();
        let State::Unlocked(current) = &*guard else {
            return Err(VaultError::VaultLocked);
        };

        // The auth layer has already checked the old password against its
        // stored hash; this guards the key swap itself against a stale or
        // mistyped credential reaching this far.
        let mut claimed = crypto::derive_with_salt(old_master_password, &current.salt, self.kdf)?;
        let matches = constant_time_eq(&claimed, &current.key);
        claimed.zeroize();
        if !matches {
            return Err(VaultError::AuthenticationFailure);
        }

        self.policy.check(new_master_password, &[])?;
        let (mut new_key, new_salt) = crypto::derive(new_master_password, self.kdf)?;

        let result = reencrypt_all(&Rekeyer {
            old_key: &current.key,
            new_key: &new_key,
        });
        if let Err(err) = result {
            new_key.zeroize();
            return Err(err);
        }

        *guard = State::Unlocked(MasterKeyMaterial {
            key: new_key,
            salt: new_salt,
        });
        new_key.zeroize();
        Ok(salt_to_hex(&new_salt))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> Vault {
        Vault::with_config(
            KdfParams::new(8192, 1, 1).unwrap(),
            StrengthPolicy::default(),
        )
    }

    #[test]
    fn starts_locked() {
        let vault = test_vault();
        assert!(!vault.is_unlocked());
        assert!(matches!(
            vault.encrypt_secret(b"secret"),
            Err(VaultError::VaultLocked)
        ));
        assert!(matches!(
            vault.decrypt_secret("1:00:00"),
            Err(VaultError::VaultLocked)
        ));
    }

    #[test]
    fn register_unlocks_and_returns_salt_hex() {
        let vault = test_vault();
        let salt_hex = vault.register("CorrectHorseBattery9!", &[]).unwrap();

        assert!(vault.is_unlocked());
        assert_eq!(salt_hex.len(), SALT_LEN * 2);
        assert!(salt_from_hex(&salt_hex).is_ok());
    }

    #[test]
    fn register_rejects_weak_master_password() {
        let vault = test_vault();
        assert!(matches!(
            vault.register("abc", &[]),
            Err(VaultError::WeakInput(_))
        ));
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn register_rejects_password_resembling_context() {
        let vault = test_vault();
        // passes the policy on its own, fails once the context penalty lands
        assert!(vault.register("alice2024", &[]).is_ok());
        let result = vault.register("alice2024", &["alice", "alice@example.com"]);
        assert!(matches!(result, Err(VaultError::WeakInput(_))));
    }

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();

        let stored = vault.encrypt_secret(b"mySiteP@ssw0rd").unwrap();
        let plaintext = vault.decrypt_secret(&stored).unwrap();

        assert_eq!(&*plaintext, b"mySiteP@ssw0rd");
    }

    #[test]
    fn lock_forgets_the_key() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();
        let stored = vault.encrypt_secret(b"secret").unwrap();

        vault.lock();
        assert!(!vault.is_unlocked());
        assert!(matches!(
            vault.decrypt_secret(&stored),
            Err(VaultError::VaultLocked)
        ));
    }

    #[test]
    fn unlock_with_same_salt_recovers_secrets() {
        let vault = test_vault();
        let salt_hex = vault.register("CorrectHorseBattery9!", &[]).unwrap();
        let stored = vault.encrypt_secret(b"mySiteP@ssw0rd").unwrap();
        vault.lock();

        vault.unlock("CorrectHorseBattery9!", &salt_hex).unwrap();
        assert_eq!(&*vault.decrypt_secret(&stored).unwrap(), b"mySiteP@ssw0rd");
    }

    #[test]
    fn unlock_with_wrong_password_fails_on_first_decrypt() {
        let vault = test_vault();
        let salt_hex = vault.register("CorrectHorseBattery9!", &[]).unwrap();
        let stored = vault.encrypt_secret(b"mySiteP@ssw0rd").unwrap();
        vault.lock();

        // unlock itself succeeds; the wrong key surfaces lazily
        vault.unlock("wrongpassword", &salt_hex).unwrap();
        assert!(vault.is_unlocked());
        assert!(matches!(
            vault.decrypt_secret(&stored),
            Err(VaultError::AuthenticationFailure)
        ));
    }

    #[test]
    fn unlock_rejects_malformed_salt() {
        let vault = test_vault();
        assert!(matches!(
            vault.unlock("CorrectHorseBattery9!", "not-hex"),
            Err(VaultError::InvalidEncoding("salt"))
        ));
    }

    #[test]
    fn rotate_reencrypts_through_the_rekeyer() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();

        let mut store = ItemStore::new();
        store
            .insert("github", &vault.encrypt_secret(b"gh-token").unwrap())
            .unwrap();
        store
            .insert("mail", &vault.encrypt_secret(b"mail-pass").unwrap())
            .unwrap();

        let new_salt_hex = vault
            .rotate("CorrectHorseBattery9!", "EvenStronger#Horse42", |rekeyer| {
                store.rekey_all(|stored| rekeyer.reencrypt(stored))
            })
            .unwrap();

        // everything decrypts under the new key
        assert_eq!(
            &*vault.decrypt_secret(store.secret("github").unwrap()).unwrap(),
            b"gh-token"
        );

        // and the new password + new salt re-derive the same key
        vault.lock();
        vault.unlock("EvenStronger#Horse42", &new_salt_hex).unwrap();
        assert_eq!(
            &*vault.decrypt_secret(store.secret("mail").unwrap()).unwrap(),
            b"mail-pass"
        );
    }

    #[test]
    fn rotate_rejects_wrong_old_password() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();

        let result = vault.rotate("wrongpassword", "EvenStronger#Horse42", |_| Ok(()));
        assert!(matches!(result, Err(VaultError::AuthenticationFailure)));
    }

    #[test]
    fn rotate_rejects_weak_new_password() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();
        let stored = vault.encrypt_secret(b"secret").unwrap();

        let result = vault.rotate("CorrectHorseBattery9!", "abc", |_| Ok(()));
        assert!(matches!(result, Err(VaultError::WeakInput(_))));

        // old key still active
        assert_eq!(&*vault.decrypt_secret(&stored).unwrap(), b"secret");
    }

    #[test]
    fn failed_rotation_leaves_old_key_usable() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();

        let mut store = ItemStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert(name, &vault.encrypt_secret(name.as_bytes()).unwrap())
                .unwrap();
        }

        let result = vault.rotate("CorrectHorseBattery9!", "EvenStronger#Horse42", |rekeyer| {
            let mut n = 0;
            store.rekey_all(|stored| {
                n += 1;
                if n == 2 {
                    Err(VaultError::EncryptionFailure)
                } else {
                    rekeyer.reencrypt(stored)
                }
            })
        });
        assert!(result.is_err());

        // still unlocked under the old key; every item still decrypts
        assert!(vault.is_unlocked());
        for name in ["a", "b", "c"] {
            assert_eq!(
                &*vault.decrypt_secret(store.secret(name).unwrap()).unwrap(),
                name.as_bytes()
            );
        }
    }

    #[test]
    fn rotate_requires_unlocked_vault() {
        let vault = test_vault();
        assert!(matches!(
            vault.rotate("CorrectHorseBattery9!", "EvenStronger#Horse42", |_| Ok(())),
            Err(VaultError::VaultLocked)
        ));
    }

    #[test]
    fn corrupt_stored_string_is_distinguished_from_wrong_key() {
        let vault = test_vault();
        vault.register("CorrectHorseBattery9!", &[]).unwrap();

        assert!(matches!(
            vault.decrypt_secret("garbage"),
            Err(VaultError::CorruptEnvelope(_))
        ));
    }
}
