use crate::engine::{Vault, VaultInner};
use crate::error::VaultError;
use crate::types::{Aes, KEY_LEN, VaultCipher};
use aead::Key;
use hkdf::Hkdf;
use private::Sealed;
use sha2::Sha256;
use std::marker::PhantomData;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// HKDF `info` label binding derived keys to the record envelope format.
const RECORD_KEY_INFO: &[u8] = b"keeper.v1.record";

#[derive(Debug, Default, ZeroizeOnDrop)]
pub struct NoKey;
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct WithKey([u8; KEY_LEN]);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoKey {}
impl Sealed for WithKey {}

/// A builder for secure initialization of the [`Vault`].
///
/// Raw key material is cleared from memory as soon as the builder is dropped or built.
#[allow(private_bounds)]
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct VaultBuilder<C: VaultCipher = Aes, K: Sealed + ZeroizeOnDrop = NoKey> {
    #[zeroize(skip)]
    _cipher: PhantomData<C>,
    key: K,
}

impl<C: VaultCipher> Default for VaultBuilder<C> {
    fn default() -> Self {
        Self { _cipher: PhantomData, key: NoKey }
    }
}

impl<C: VaultCipher> VaultBuilder<C> {
    #[must_use = "Builder must be given a key before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `secret` as the raw AES-256 key.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] unless `secret` is exactly 32 bytes.
    pub fn key(self, secret: impl AsRef<[u8]>) -> Result<VaultBuilder<C, WithKey>, VaultError> {
        let secret = secret.as_ref();
        let key: [u8; KEY_LEN] =
            secret.try_into().map_err(|_| VaultError::InvalidConfiguration {
                message: format!("Invalid key length {}, must be {KEY_LEN} bytes", secret.len())
                    .into(),
                context: Some("Raw key".into()),
            })?;

        Ok(VaultBuilder { _cipher: PhantomData, key: WithKey(key) })
    }

    /// Derives the key from a secret of any length using HKDF-SHA256.
    ///
    /// # Arguments
    /// * `ikm`: Input Keying Material (the configured secret).
    /// * `salt`: Uniquifies the key across deployments sharing a secret.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] if the secret is empty or expansion fails.
    pub fn derived_key(
        self,
        ikm: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
    ) -> Result<VaultBuilder<C, WithKey>, VaultError> {
        if ikm.as_ref().is_empty() {
            return Err(VaultError::InvalidConfiguration {
                message: "Secret cannot be empty".into(),
                context: Some("Derived key".into()),
            });
        }

        let (_, hk) = Hkdf::<Sha256>::extract(Some(salt.as_ref()), ikm.as_ref());
        let mut key = [0u8; KEY_LEN];

        hk.expand(RECORD_KEY_INFO, &mut key).map_err(|_| VaultError::InvalidConfiguration {
            message: "HKDF expansion failed for record key".into(),
            context: None,
        })?;

        Ok(VaultBuilder { _cipher: PhantomData, key: WithKey(key) })
    }
}

impl<C: VaultCipher> VaultBuilder<C, WithKey> {
    /// Finalizes vault construction and `zeroes` the builder.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] if the cipher rejects the key.
    pub fn build(mut self) -> Result<Vault<C>, VaultError> {
        let key = Key::<C>::try_from(&self.key.0[..]).map_err(|_| {
            VaultError::InvalidConfiguration {
                message: format!("Cipher does not accept a {KEY_LEN}-byte key").into(),
                context: None,
            }
        })?;
        let cipher = C::new(&key);

        self.zeroize();

        Ok(Vault { inner: Arc::new(VaultInner { cipher }) })
    }
}
