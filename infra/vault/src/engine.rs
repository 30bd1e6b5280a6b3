use aead::Nonce;
use aead::inout::InOutBuf;
use getrandom::fill;
use keeper_domain::config::VaultConfig;
use keeper_domain::record::RecordKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use zeroize::Zeroize;

use crate::builder::VaultBuilder;
use crate::error::{VaultError, VaultErrorExt};
use crate::fields::FieldMap;
use crate::types::{Aes, NONCE_LEN, TAG_LEN, VaultCipher};

#[allow(unreachable_pub)]
#[derive(Debug)]
pub struct VaultInner<C = Aes>
where
    C: VaultCipher,
{
    pub cipher: C,
}

/// A thread-safe container for the record key.
///
/// `Vault` wraps its cipher in an [`Arc`], making it cheaply clonable and safe to share across
/// sessions. The default cipher is [`Aes`] (AES-256-GCM).
#[derive(Debug)]
pub struct Vault<C = Aes>
where
    C: VaultCipher,
{
    pub(crate) inner: Arc<VaultInner<C>>,
}

impl<C: VaultCipher> Clone for Vault<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C> Vault<C>
where
    C: VaultCipher,
{
    /// Returns a new [`VaultBuilder`] to configure the vault.
    #[must_use]
    pub fn builder() -> VaultBuilder<C> {
        VaultBuilder::<C>::new()
    }

    /// Builds a vault from the `vault` config section.
    ///
    /// Without a salt the secret must be the raw 32-byte key; with one the key is derived.
    ///
    /// # Errors
    /// [`VaultError::InvalidConfiguration`] if the secret cannot produce a key.
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        match &config.salt {
            Some(salt) => Self::builder().derived_key(&config.secret, salt)?.build(),
            None => Self::builder().key(&config.secret)?.build(),
        }
    }

    /// Encrypts the field values of a record into a hex envelope.
    ///
    /// `values` are the record fields in the order of [`RecordKind::field_names`], without the
    /// title.
    ///
    /// # Errors
    /// * [`VaultError::Format`] If the number of values does not match the kind. Nothing is
    ///   encrypted in that case.
    /// * [`VaultError::Serialization`] If the field map cannot be serialized.
    /// * [`VaultError::Encryption`] If the RNG or the AEAD cipher fails.
    pub fn encode<S: AsRef<str>>(
        &self,
        kind: RecordKind,
        values: &[S],
    ) -> Result<String, VaultError> {
        let names = kind.field_names();
        if values.len() != names.len() {
            return Err(VaultError::Format {
                message: format!("expected {} fields, got {}", names.len(), values.len()).into(),
                context: Some(format!("kind={kind}").into()),
            });
        }

        let map: BTreeMap<&str, &str> =
            names.iter().copied().zip(values.iter().map(AsRef::as_ref)).collect();
        let mut plaintext = serde_json::to_vec(&map).context("Field map encoding failed")?;

        let sealed = self.seal(&plaintext);
        plaintext.zeroize();

        Ok(hex::encode(sealed?))
    }

    /// Opens a hex envelope produced by [`Vault::encode`].
    ///
    /// # Errors
    /// * [`VaultError::Encoding`] If the envelope is not hex.
    /// * [`VaultError::InvalidPayload`] If it is too short to hold a nonce and a tag.
    /// * [`VaultError::Decryption`] If the key is wrong or the data was tampered with.
    /// * [`VaultError::Serialization`] If the plaintext is not a field map.
    pub fn decode(&self, envelope: impl AsRef<str>) -> Result<FieldMap, VaultError> {
        let blob = hex::decode(envelope.as_ref().trim()).context("Envelope is not hex")?;
        let mut plaintext = self.open(&blob)?;

        let parsed = serde_json::from_slice::<BTreeMap<String, String>>(&plaintext)
            .context("Field map decoding failed");
        plaintext.zeroize();

        Ok(FieldMap::from(parsed?))
    }

    /// Seals raw bytes as `nonce ‖ ciphertext ‖ tag`.
    ///
    /// # Errors
    /// * [`VaultError::Encryption`] If the RNG or the AEAD cipher fails.
    pub fn seal(&self, data: impl AsRef<[u8]>) -> Result<Vec<u8>, VaultError> {
        let data = data.as_ref();
        let nonce = Self::next_nonce()?;

        let mut buf = Vec::with_capacity(NONCE_LEN + data.len() + TAG_LEN);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(data);

        let (_nonce_part, data_part) = buf.split_at_mut(NONCE_LEN);
        let in_out = InOutBuf::from(data_part);

        let tag = self.inner.cipher.encrypt_inout_detached(&nonce, &[], in_out).map_err(|_| {
            VaultError::Encryption {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            }
        })?;

        buf.extend_from_slice(tag.as_slice());
        Ok(buf)
    }

    /// Opens bytes produced by [`Vault::seal`].
    ///
    /// # Errors
    /// * [`VaultError::InvalidPayload`] If the blob is shorter than a nonce plus a tag.
    /// * [`VaultError::Decryption`] If authentication fails.
    pub fn open(&self, blob: impl AsRef<[u8]>) -> Result<Vec<u8>, VaultError> {
        let blob = blob.as_ref();
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::InvalidPayload {
                message: format!(
                    "Payload too short ({} bytes). Expected at least {} bytes",
                    blob.len(),
                    NONCE_LEN + TAG_LEN
                )
                .into(),
                context: None,
            });
        }

        let (nonce_slice, rest) = blob.split_at(NONCE_LEN);
        let (ciphertext, tag_slice) = rest.split_at(rest.len() - TAG_LEN);

        let nonce = nonce_slice.try_into().map_err(|_| VaultError::Decryption {
            message: "Invalid nonce length".into(),
            context: None,
        })?;

        let tag = tag_slice.try_into().map_err(|_| VaultError::Decryption {
            message: "Invalid tag length".into(),
            context: None,
        })?;

        let mut buf = ciphertext.to_vec();
        let in_out = InOutBuf::from(&mut buf[..]);

        if self.inner.cipher.decrypt_inout_detached(&nonce, &[], in_out, &tag).is_err() {
            buf.zeroize();
            return Err(VaultError::Decryption {
                message: "Decryption failed".into(),
                context: Some("AEAD authentication failed".into()),
            });
        }

        Ok(buf)
    }

    fn next_nonce() -> Result<Nonce<C>, VaultError> {
        let mut nonce = Nonce::<C>::default();
        fill(&mut nonce).map_err(|e| VaultError::Encryption {
            message: e.to_string().into(),
            context: Some("System RNG unavailable for nonce generation".into()),
        })?;
        Ok(nonce)
    }
}
