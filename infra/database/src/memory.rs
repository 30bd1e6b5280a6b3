use crate::error::StorageError;
use crate::provider::{ClientRecord, StorageProvider};
use fxhash::FxHashMap;
use keeper_domain::record::RecordKind;
use keeper_domain::session::SessionState;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
struct StoredRecord {
    kind: RecordKind,
    envelope: String,
}

#[derive(Debug, Default)]
struct Tables {
    /// username -> password hash
    accounts: FxHashMap<String, String>,
    /// owner -> title -> record
    records: FxHashMap<String, BTreeMap<String, StoredRecord>>,
    /// client id -> mirror
    clients: FxHashMap<String, ClientRecord>,
}

/// Process-local [`StorageProvider`] for tests and throwaway servers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of a stored record, if present.
    #[must_use]
    pub fn record_kind(&self, username: &str, title: &str) -> Option<RecordKind> {
        self.tables.read().records.get(username)?.get(title).map(|record| record.kind)
    }
}

impl StorageProvider for MemoryStorage {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.accounts.contains_key(username) {
            return Err(StorageError::Conflict {
                message: "username already exists".into(),
                context: Some(format!("username={username}").into()),
            });
        }
        tables.accounts.insert(username.to_owned(), password_hash.to_owned());
        Ok(())
    }

    async fn exist_user(&self, username: &str, password_hash: &str) -> Result<bool, StorageError> {
        Ok(self.tables.read().accounts.get(username).is_some_and(|hash| hash == password_hash))
    }

    async fn titles_by_user(&self, username: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .tables
            .read()
            .records
            .get(username)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_data(&self, username: &str, title: &str) -> Result<String, StorageError> {
        self.tables
            .read()
            .records
            .get(username)
            .and_then(|records| records.get(title))
            .map(|record| record.envelope.clone())
            .ok_or_else(|| StorageError::NotFound {
                message: format!("record '{title}'").into(),
                context: Some(format!("owner={username}").into()),
            })
    }

    async fn create_data(
        &self,
        username: &str,
        title: &str,
        kind: RecordKind,
        envelope: &str,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        let records = tables.records.entry(username.to_owned()).or_default();
        if records.contains_key(title) {
            return Err(StorageError::Conflict {
                message: "record title already exists".into(),
                context: Some(format!("owner={username}, title={title}").into()),
            });
        }
        records.insert(title.to_owned(), StoredRecord { kind, envelope: envelope.to_owned() });
        Ok(())
    }

    async fn add_client(
        &self,
        client_id: &str,
        username: &str,
        state: SessionState,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.clients.contains_key(client_id) {
            return Err(StorageError::Conflict {
                message: "client id already exists".into(),
                context: Some(format!("client_id={client_id}").into()),
            });
        }
        tables.clients.insert(
            client_id.to_owned(),
            ClientRecord { client_id: client_id.to_owned(), username: username.to_owned(), state },
        );
        Ok(())
    }

    async fn update_client_state(
        &self,
        client_id: &str,
        state: SessionState,
    ) -> Result<(), StorageError> {
        if let Some(client) = self.tables.write().clients.get_mut(client_id) {
            client.state = state;
        }
        Ok(())
    }

    async fn remove_client(&self, client_id: &str) -> Result<(), StorageError> {
        self.tables.write().clients.remove(client_id);
        Ok(())
    }

    async fn all_clients(&self) -> Result<Vec<ClientRecord>, StorageError> {
        Ok(self.tables.read().clients.values().cloned().collect())
    }
}
