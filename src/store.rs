//! In-memory store of encrypted items.
//!
//! Entries hold the opaque stored-secret string produced by the vault;
//! plaintext never enters this module. Serves as the item-store collaborator
//! during master-password rotation and as an import/export surface for the
//! embedding application.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{StoreError, VaultError};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ItemStore {
    items: HashMap<String, ItemEntry>,
    creation_date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ItemEntry {
    name: String,
    secret: String,
    updated: String,
}

impl ItemEntry {
    fn new(name: String, secret: String) -> Self {
        Self {
            name,
            secret,
            updated: Local::now().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored-secret string, opaque to this module.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn updated(&self) -> &str {
        &self.updated
    }

    fn replace_secret(&mut self, secret: String) {
        self.secret = secret;
        self.updated = Local::now().to_string();
    }
}

impl ItemStore {
    pub fn new() -> Self {
        ItemStore {
            items: HashMap::new(),
            creation_date: Local::now().to_string(),
        }
    }

    pub fn insert(&mut self, name: &str, secret: &str) -> Result<(), StoreError> {
        if self.items.contains_key(name) {
            Err(StoreError::ItemAlreadyExists(name.to_string()))
        } else {
            self.items.insert(
                name.to_string(),
                ItemEntry::new(name.to_string(), secret.to_string()),
            );
            Ok(())
        }
    }

    pub fn secret(&self, name: &str) -> Option<&str> {
        self.items.get(name).map(|e| e.secret())
    }

    pub fn update(&mut self, name: &str, secret: &str) -> Result<(), StoreError> {
        match self.items.get_mut(name) {
            Some(entry) => {
                entry.replace_secret(secret.to_string());
                Ok(())
            }
            None => Err(StoreError::ItemNotFound(name.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        if self.items.remove(name).is_some() {
            Ok(())
        } else {
            Err(StoreError::ItemNotFound(name.to_string()))
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ItemEntry> {
        self.items.values()
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replaces every stored secret with `rekey(secret)`, all-or-nothing.
    ///
    /// The replacement map is built first and swapped in only once every
    /// entry has re-encrypted; on the first failure the store is left
    /// untouched. Used by the vault's master-password rotation.
    pub fn rekey_all<F>(&mut self, mut rekey: F) -> Result<(), VaultError>
    where
        F: FnMut(&str) -> Result<String, VaultError>,
    {
        let mut rekeyed: HashMap<String, ItemEntry> = HashMap::with_capacity(self.items.len());
        for (name, entry) in &self.items {
            let mut entry = entry.clone();
            entry.replace_secret(rekey(&entry.secret)?);
            rekeyed.insert(name.clone(), entry);
        }
        self.items = rekeyed;
        Ok(())
    }

    /// Serializes the store, entries still encrypted, for backup or export.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(data)?)
    }
}
