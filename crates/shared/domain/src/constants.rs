/// Separator between fields of a structured create payload (`title::login::password::meta`).
pub const FIELD_DELIMITER: &str = "::";

/// Separator between the username and the nonce of a client id.
pub const CLIENT_ID_DELIMITER: &str = "::";

/// Sender name used for server-originated envelopes.
pub const SERVER_SENDER: &str = "server";

/// `OpenAPI` tag for system endpoints.
pub const SYSTEM_TAG: &str = "System";

/// `OpenAPI` tag for account endpoints.
pub const IDENTITY_TAG: &str = "Identity";

/// `OpenAPI` tag for the command stream.
pub const SESSION_TAG: &str = "Session";
