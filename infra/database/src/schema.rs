//! SurrealQL schema applied by [`SurrealStorage::init`](crate::SurrealStorage).
//!
//! Every statement is idempotent so initialization can run on every start.

pub(crate) const SCHEMA: &str = r"
DEFINE TABLE IF NOT EXISTS account SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS username ON account TYPE string;
DEFINE FIELD IF NOT EXISTS password_hash ON account TYPE string;
DEFINE INDEX IF NOT EXISTS account_username ON account FIELDS username UNIQUE;

DEFINE TABLE IF NOT EXISTS vault_record SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS owner ON vault_record TYPE string;
DEFINE FIELD IF NOT EXISTS title ON vault_record TYPE string;
DEFINE FIELD IF NOT EXISTS kind ON vault_record TYPE string;
DEFINE FIELD IF NOT EXISTS envelope ON vault_record TYPE string;
DEFINE FIELD IF NOT EXISTS created_at ON vault_record TYPE datetime DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS vault_record_owner_title ON vault_record FIELDS owner, title UNIQUE;

DEFINE TABLE IF NOT EXISTS client_session SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS client_id ON client_session TYPE string;
DEFINE FIELD IF NOT EXISTS username ON client_session TYPE string;
DEFINE FIELD IF NOT EXISTS state ON client_session TYPE string;
DEFINE INDEX IF NOT EXISTS client_session_client_id ON client_session FIELDS client_id UNIQUE;
";

pub(crate) const CREATE_ACCOUNT: &str =
    "CREATE account CONTENT { username: $username, password_hash: $password_hash } RETURN NONE;";

pub(crate) const FIND_ACCOUNT: &str = "SELECT username FROM account \
     WHERE username = $username AND password_hash = $password_hash LIMIT 1;";

pub(crate) const LIST_TITLES: &str =
    "SELECT title FROM vault_record WHERE owner = $owner ORDER BY title ASC;";

pub(crate) const GET_ENVELOPE: &str =
    "SELECT envelope FROM vault_record WHERE owner = $owner AND title = $title LIMIT 1;";

pub(crate) const CREATE_RECORD: &str = "CREATE vault_record CONTENT \
     { owner: $owner, title: $title, kind: $kind, envelope: $envelope } RETURN NONE;";

pub(crate) const CREATE_CLIENT: &str = "CREATE client_session CONTENT \
     { client_id: $client_id, username: $username, state: $state } RETURN NONE;";

pub(crate) const UPDATE_CLIENT: &str =
    "UPDATE client_session SET state = $state WHERE client_id = $client_id RETURN NONE;";

pub(crate) const DELETE_CLIENT: &str =
    "DELETE client_session WHERE client_id = $client_id RETURN NONE;";

pub(crate) const LIST_CLIENTS: &str = "SELECT client_id, username, state FROM client_session;";
