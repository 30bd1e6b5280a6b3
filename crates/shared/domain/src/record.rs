use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// The kind of secret a vault record holds.
///
/// Each kind has a fixed, ordered set of field names. The last field is always the free-text
/// `meta` note.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    Password,
    Text,
    Card,
    Binary,
}

impl RecordKind {
    /// All kinds, in create-menu order.
    pub const ALL: [Self; 4] = [Self::Password, Self::Text, Self::Card, Self::Binary];

    /// Field names stored in the encrypted map, in entry order.
    #[must_use]
    pub const fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Password => &["login", "password", "meta"],
            Self::Text => &["text", "meta"],
            Self::Card => &["card_num", "expiration_date", "owner", "cvv", "meta"],
            Self::Binary => &["bytes", "meta"],
        }
    }

    /// Number of `::`-separated parts of a create payload, title included.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.field_names().len() + 1
    }

    /// Resolves a 1-based create-menu choice.
    #[must_use]
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        let index = choice.parse::<usize>().ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn arity_counts_title_and_meta() {
        assert_eq!(RecordKind::Password.arity(), 4);
        assert_eq!(RecordKind::Text.arity(), 3);
        assert_eq!(RecordKind::Binary.arity(), 3);
        assert_eq!(RecordKind::Card.arity(), 6);

        for kind in RecordKind::ALL {
            assert_eq!(kind.field_names().last(), Some(&"meta"));
        }
    }

    #[test]
    fn menu_choice_is_one_based() {
        assert_eq!(RecordKind::from_menu_choice("1"), Some(RecordKind::Password));
        assert_eq!(RecordKind::from_menu_choice("4"), Some(RecordKind::Binary));
        assert_eq!(RecordKind::from_menu_choice("0"), None);
        assert_eq!(RecordKind::from_menu_choice("5"), None);
        assert_eq!(RecordKind::from_menu_choice("card"), None);
    }

    #[test]
    fn string_form_is_snake_case() {
        assert_eq!(RecordKind::Card.to_string(), "card");
        assert_eq!(RecordKind::from_str("binary").ok(), Some(RecordKind::Binary));
    }
}
