use hex_literal::hex;
use keeper_domain::record::RecordKind;
use keeper_vault::Vault;

/// Fixed 256-bit test key.
pub const TEST_KEY: [u8; 32] =
    hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");

/// Initializes a Vault instance with the fixed test key.
/// # Panics
/// * If Vault setup fails, the function will panic.
#[must_use]
pub fn setup_vault() -> Vault {
    Vault::builder().key(TEST_KEY).unwrap().build().expect("Vault setup failed")
}

/// One valid value tuple per record kind.
#[must_use]
pub fn sample_values(kind: RecordKind) -> Vec<&'static str> {
    match kind {
        RecordKind::Password => vec!["bob", "pw", "notes"],
        RecordKind::Text => vec!["remember the milk", ""],
        RecordKind::Card => vec!["4111111111111111", "12/29", "ALICE SMITH", "123", "visa"],
        RecordKind::Binary => vec!["deadbeef", "firmware blob"],
    }
}
