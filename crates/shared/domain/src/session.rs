use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Position of a session in the command protocol.
///
/// The string form (`SELECT_ACTION`, ...) is what the durable session mirror stores.
#[derive(
    Debug,
    Default,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Connection accepted, no envelope received yet.
    #[default]
    Handshake,
    /// Idle after the handshake or after a completed action.
    Connected,
    /// Main menu shown, waiting for an action.
    SelectAction,
    /// Title list shown, waiting for a number.
    GetData,
    /// Create submenu shown, waiting for a record kind.
    ChoseCreateData,
    /// Field template shown, waiting for the delimited payload.
    CreateData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mirror_form_round_trips() {
        assert_eq!(SessionState::ChoseCreateData.to_string(), "CHOSE_CREATE_DATA");
        assert_eq!(SessionState::from_str("GET_DATA").ok(), Some(SessionState::GetData));
        assert!(SessionState::from_str("UNKNOWN").is_err());
    }
}
