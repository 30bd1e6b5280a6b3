use crate::error::StorageError;
use keeper_domain::record::RecordKind;
use keeper_domain::session::SessionState;
use std::future::Future;

/// A durable mirror row of one registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub client_id: String,
    pub username: String,
    pub state: SessionState,
}

/// Persistence contract consumed by the identity service and the session engine.
///
/// Implementations own their internal concurrency; every call is a single independent
/// operation and no transaction spans two calls.
pub trait StorageProvider: Clone + Send + Sync + 'static {
    /// Prepares the backing store (schema, indexes). Safe to call more than once.
    fn init(&self) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Creates an account. A taken username is [`StorageError::Conflict`].
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Returns `true` if an account with exactly this username and hash exists.
    fn exist_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Titles of every record owned by `username`, sorted by title.
    fn titles_by_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    /// Envelope of one record. A missing record is [`StorageError::NotFound`].
    fn get_data(
        &self,
        username: &str,
        title: &str,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Stores a record. A duplicate `(username, title)` is [`StorageError::Conflict`].
    fn create_data(
        &self,
        username: &str,
        title: &str,
        kind: RecordKind,
        envelope: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Mirrors a newly registered session. A duplicate id is [`StorageError::Conflict`].
    fn add_client(
        &self,
        client_id: &str,
        username: &str,
        state: SessionState,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Updates the mirrored state of a session. Unknown ids are ignored.
    fn update_client_state(
        &self,
        client_id: &str,
        state: SessionState,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Deletes a session mirror. Unknown ids are ignored.
    fn remove_client(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Every mirrored session.
    fn all_clients(&self) -> impl Future<Output = Result<Vec<ClientRecord>, StorageError>> + Send;
}
