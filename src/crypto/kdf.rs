use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use super::{KEY_LEN, SALT_LEN, generate_salt, salt_from_hex};
use crate::error::VaultError;

/// Argon2id cost parameters.
///
/// These are part of the embedding application's configuration; changing
/// them changes derived keys, so deployed values must stay fixed for the
/// lifetime of a user's salt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 64 * 1024, // 64 MiB
            time_cost: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self, VaultError> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.mem_cost_kib < 8 {
            return Err(VaultError::InvalidKdfParams("memory cost too low"));
        }
        if self.time_cost < 1 {
            return Err(VaultError::InvalidKdfParams("time cost must be >= 1"));
        }
        if self.parallelism < 1 {
            return Err(VaultError::InvalidKdfParams("parallelism must be >= 1"));
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return Err(VaultError::InvalidKdfParams(
                "memory cost must be at least 8 * parallelism",
            ));
        }
        Ok(())
    }
}

/// Derive a key under a fresh random salt.
///
/// Used at registration and master-password rotation; the returned salt is
/// handed to the external user store for persistence.
pub fn derive(
    password: &str,
    kdf: KdfParams,
) -> Result<([u8; KEY_LEN], [u8; SALT_LEN]), VaultError> {
    let salt = generate_salt()?;
    let key = derive_with_salt(password, &salt, kdf)?;
    Ok((key, salt))
}

/// Derive a key deterministically from password and salt.
pub fn derive_with_salt(
    password: &str,
    salt: &[u8; SALT_LEN],
    kdf: KdfParams,
) -> Result<[u8; KEY_LEN], VaultError> {
    if password.is_empty() {
        return Err(VaultError::WeakInput(
            "master password must not be empty".into(),
        ));
    }
    kdf.validate()?;

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|_| VaultError::KdfFailure)?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|_| VaultError::KdfFailure)?;

    Ok(key)
}

/// Re-derive a key from the salt persisted at registration.
pub fn rederive(
    password: &str,
    salt_hex: &str,
    kdf: KdfParams,
) -> Result<[u8; KEY_LEN], VaultError> {
    let salt = salt_from_hex(salt_hex)?;
    derive_with_salt(password, &salt, kdf)
}
