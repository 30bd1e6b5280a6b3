//! # Vault Errors
//!
//! [`VaultError`] covers every failure of the envelope codec: field validation, sealing,
//! opening, hex decoding and JSON (de)serialization.

use std::borrow::Cow;

/// A specialized [`VaultError`] enum for codec failures.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Field values do not match the record kind (no encryption was attempted).
    #[error("Format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during the encryption process.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during the decryption process.
    ///
    /// This usually indicates a wrong key or tampered data. No plaintext is returned.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The envelope is shorter than a nonce plus a tag.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The envelope is not valid hex.
    #[error("Encoding error{}: {source}", format_context(.context))]
    Encoding { source: hex::FromHexError, context: Option<Cow<'static, str>> },

    /// Failure during JSON serialization or deserialization of the field map.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Failure when the vault or builder is incorrectly configured.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    /// Returns `true` for failures caused by the envelope content rather than by the caller.
    #[must_use]
    pub const fn is_corrupted(&self) -> bool {
        matches!(
            self,
            Self::Decryption { .. }
                | Self::InvalidPayload { .. }
                | Self::Encoding { .. }
                | Self::Serialization { .. }
        )
    }
}

pub trait VaultErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, VaultError>;
}

impl<T> VaultErrorExt<T> for Result<T, VaultError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                VaultError::Format { context: c, .. }
                | VaultError::Encryption { context: c, .. }
                | VaultError::Decryption { context: c, .. }
                | VaultError::InvalidPayload { context: c, .. }
                | VaultError::Encoding { context: c, .. }
                | VaultError::Serialization { context: c, .. }
                | VaultError::InvalidConfiguration { context: c, .. } => {
                    *c = Some(context.into());
                }
            }
            e
        })
    }
}

impl<T> VaultErrorExt<T> for Result<T, hex::FromHexError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, VaultError> {
        self.map_err(|source| VaultError::Encoding { source, context: Some(context.into()) })
    }
}

impl<T> VaultErrorExt<T> for Result<T, serde_json::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, VaultError> {
        self.map_err(|source| VaultError::Serialization { source, context: Some(context.into()) })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
