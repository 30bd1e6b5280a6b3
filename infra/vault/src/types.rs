use aead::{AeadInOut, KeyInit};
use aes_gcm::Aes256Gcm;

pub type Aes = Aes256Gcm;

pub trait VaultCipher: AeadInOut + KeyInit + 'static {}
impl<T: AeadInOut + KeyInit + 'static> VaultCipher for T {}

/// Raw key length (256-bit).
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (96-bit).
pub const NONCE_LEN: usize = 12;

/// AEAD tag length (128-bit).
pub const TAG_LEN: usize = 16;
