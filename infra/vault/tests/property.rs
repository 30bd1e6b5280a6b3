pub mod fixtures;

use fixtures::setup_vault;
use keeper_domain::record::RecordKind;
use keeper_vault::{NONCE_LEN, TAG_LEN, VaultError};
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = RecordKind> {
    prop::sample::select(RecordKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn decode_inverts_encode(
        kind in kind_strategy(),
        pool in prop::collection::vec(".{0,48}", 5),
    ) {
        let vault = setup_vault();
        let values = &pool[..kind.field_names().len()];

        let envelope = vault.encode(kind, values).unwrap();
        let fields = vault.decode(&envelope).unwrap();

        prop_assert_eq!(fields.len(), values.len());
        for (name, value) in kind.field_names().iter().zip(values) {
            prop_assert_eq!(fields.get(name), Some(value.as_str()));
        }
    }

    #[test]
    fn any_single_bit_flip_is_rejected(
        text in ".{0,64}",
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let vault = setup_vault();
        let envelope = vault.encode(RecordKind::Text, &[text.as_str(), "meta"]).unwrap();
        let mut raw = hex::decode(&envelope).unwrap();

        let index = position.index(raw.len());
        raw[index] ^= 1 << bit;

        let result = vault.decode(hex::encode(&raw));
        prop_assert!(matches!(result, Err(VaultError::Decryption { .. })));
    }

    #[test]
    fn arity_mismatch_is_format_error(kind in kind_strategy(), count in 0usize..8) {
        prop_assume!(count != kind.field_names().len());
        let vault = setup_vault();
        let values = vec!["v"; count];

        prop_assert!(matches!(vault.encode(kind, &values), Err(VaultError::Format { .. })));
    }

    #[test]
    fn short_blobs_never_decode(len in 0usize..(NONCE_LEN + TAG_LEN)) {
        let vault = setup_vault();
        let result = vault.decode(hex::encode(vec![0u8; len]));
        prop_assert!(matches!(result, Err(VaultError::InvalidPayload { .. })));
    }
}
