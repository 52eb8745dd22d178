//! User accounts, stored as argon2 hashes.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::BackendError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Credentials {
    username: String,
    hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    users: Vec<Credentials>,
}

#[derive(Debug, Default)]
pub struct UserStore {
    path: Option<PathBuf>,
    users: BTreeMap<String, String>,
}

impl UserStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store backed by `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let users = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let file: UsersFile = serde_json::from_str(&data)?;
            file.users
                .into_iter()
                .map(|c| (c.username, c.hash))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), users = users.len(), "user store opened");
        Ok(Self {
            path: Some(path),
            users,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn create(&mut self, username: &str, password: &str) -> Result<(), BackendError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BackendError::invalid("Username must not be empty"));
        }
        if password.is_empty() {
            return Err(BackendError::invalid("Password must not be empty"));
        }
        if self.exists(username) {
            return Err(BackendError::invalid(format!(
                "User '{username}' already exists"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| BackendError::Hash(e.to_string()))?
            .to_string();

        self.users.insert(username.to_string(), hash);
        if let Err(e) = self.persist() {
            self.users.remove(username);
            return Err(e);
        }
        info!(user = %username, "user created");
        Ok(())
    }

    /// Check a password. Unknown users simply don't verify.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, BackendError> {
        let Some(stored) = self.users.get(username.trim()) else {
            return Ok(false);
        };
        let parsed = PasswordHash::new(stored)
            .map_err(|e| BackendError::Hash(format!("invalid stored hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn persist(&self) -> Result<(), BackendError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = UsersFile {
            users: self
                .users
                .iter()
                .map(|(username, hash)| Credentials {
                    username: username.clone(),
                    hash: hash.clone(),
                })
                .collect(),
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_verify() {
        let mut store = UserStore::in_memory();
        store.create("ada", "lovelace").unwrap();
        assert!(store.verify("ada", "lovelace").unwrap());
        assert!(!store.verify("ada", "babbage").unwrap());
        assert!(!store.verify("nobody", "lovelace").unwrap());
    }

    #[test]
    fn rejects_duplicates_and_blanks() {
        let mut store = UserStore::in_memory();
        store.create("ada", "pw").unwrap();
        assert!(matches!(store.create("ada", "x"), Err(BackendError::Invalid(_))));
        assert!(matches!(store.create("  ", "x"), Err(BackendError::Invalid(_))));
        assert!(matches!(store.create("bob", ""), Err(BackendError::Invalid(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn hashes_are_not_plaintext() {
        let mut store = UserStore::in_memory();
        store.create("ada", "lovelace").unwrap();
        let hash = store.users.get("ada").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("lovelace"));
    }
}
