//! Envelope codec for vault records.
//!
//! A record's fields are collected into a map keyed by the field names of its
//! [`RecordKind`](keeper_domain::record::RecordKind), serialized as canonical JSON, sealed with
//! AES-256-GCM and hex-encoded so the storage layer can keep it as plain text.
//!
//! ## Envelope Format
//!
//! ```text
//! hex( [NONCE(12)][CIPHERTEXT(N)][TAG(16)] )
//! ```
//!
//! No associated data is bound: the envelope is opened with the key alone.
//!
//! ## Nonce Policy
//!
//! Every seal draws a fresh **random 96-bit nonce** from the OS RNG. This is the standard
//! approach for `AES-GCM` but it is probabilistic; rotate keys long before the birthday bound
//! for a single key becomes relevant.
//!
//! ## Example
//!
//! ```rust
//! use keeper_domain::record::RecordKind;
//! use keeper_vault::{Vault, VaultError};
//!
//! # fn main() -> Result<(), VaultError> {
//! let vault = Vault::builder().key("thisis32byteencryptionkey1234567")?.build()?;
//!
//! let envelope = vault.encode(RecordKind::Password, &["bob", "pw", "notes"])?;
//! let fields = vault.decode(&envelope)?;
//!
//! assert_eq!(fields.get("login"), Some("bob"));
//! assert!(fields.render().contains("password: pw"));
//! # Ok(())
//! # }
//! ```

mod builder;
mod engine;
mod error;
mod fields;
mod types;

pub use builder::VaultBuilder;
pub use engine::Vault;
pub use error::{VaultError, VaultErrorExt};
pub use fields::FieldMap;
pub use types::{Aes, KEY_LEN, NONCE_LEN, TAG_LEN, VaultCipher};
