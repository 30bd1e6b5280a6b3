//! Account registration and login.
//!
//! Passwords are stored as lowercase hex SHA-256 digests; login compares digests through the
//! storage provider.

mod error;

pub use crate::error::{IdentityError, IdentityErrorExt};

use keeper_database::StorageProvider;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

/// Hex SHA-256 digest of a password.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Register / login over any [`StorageProvider`].
#[derive(Debug, Clone)]
pub struct IdentityService<S: StorageProvider> {
    storage: S,
}

impl<S: StorageProvider> IdentityService<S> {
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Creates an account.
    ///
    /// # Errors
    /// * [`IdentityError::Validation`] for a blank username or an empty password.
    /// * [`IdentityError::AlreadyExists`] if the username is taken.
    /// * [`IdentityError::Internal`] for other storage failures.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        let username = validate(username, password)?;

        self.storage
            .create_user(username, &hash_password(password))
            .await
            .context(format!("username={username}"))?;

        info!("Account registered");
        Ok(())
    }

    /// Checks credentials.
    ///
    /// # Errors
    /// * [`IdentityError::Validation`] for a blank username or an empty password.
    /// * [`IdentityError::Unauthenticated`] for unknown users and wrong passwords alike.
    /// * [`IdentityError::Internal`] for storage failures.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        let username = validate(username, password)?;

        let known = self
            .storage
            .exist_user(username, &hash_password(password))
            .await
            .context(format!("username={username}"))?;

        if !known {
            warn!("Rejected login");
            return Err(IdentityError::Unauthenticated {
                message: "wrong credentials".into(),
                context: None,
            });
        }

        info!("Login accepted");
        Ok(())
    }
}

fn validate<'a>(username: &'a str, password: &str) -> Result<&'a str, IdentityError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(IdentityError::Validation {
            message: "username and password are required".into(),
            context: None,
        });
    }
    Ok(username)
}
