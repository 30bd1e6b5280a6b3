//! Wire envelope of the command stream.
//!
//! Every frame in both directions carries a sender and a single free-text payload. The
//! session state machine is what gives the payload its meaning.

use crate::constants::SERVER_SENDER;
use serde::{Deserialize, Serialize};

/// A single command stream envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    /// Sender username, or [`SERVER_SENDER`] for server-originated frames.
    #[serde(default)]
    pub username: String,
    /// Free-text payload.
    #[serde(default)]
    pub message: String,
}

impl CommandMessage {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self { username: username.into(), message: message.into() }
    }

    /// Builds an envelope sent on behalf of the server.
    pub fn from_server(message: impl Into<String>) -> Self {
        Self::new(SERVER_SENDER, message)
    }
}
