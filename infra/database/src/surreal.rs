use crate::connection::Database;
use crate::error::{StorageError, StorageErrorExt};
use crate::provider::{ClientRecord, StorageProvider};
use crate::schema;
use keeper_domain::config::DatabaseConfig;
use keeper_domain::record::RecordKind;
use keeper_domain::session::SessionState;
use std::borrow::Cow;
use surrealdb::types::SurrealValue;
use tracing::{debug, instrument};

/// Marker of a unique index violation in `SurrealDB` error messages.
const UNIQUE_VIOLATION: &str = "already contains";

#[derive(Debug, SurrealValue)]
struct UsernameRow {
    username: String,
}

#[derive(Debug, SurrealValue)]
struct TitleRow {
    title: String,
}

#[derive(Debug, SurrealValue)]
struct EnvelopeRow {
    envelope: String,
}

#[derive(Debug, SurrealValue)]
struct ClientRow {
    client_id: String,
    username: String,
    state: String,
}

/// [`StorageProvider`] backed by `SurrealDB`.
#[derive(Debug, Clone)]
pub struct SurrealStorage {
    db: Database,
}

impl SurrealStorage {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connects with the given settings and applies the schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let mut builder =
            Database::builder().url(&config.url).session(&config.namespace, &config.database);
        if let Some(credentials) = &config.credentials {
            builder = builder.auth(&credentials.username, &credentials.password);
        }

        let storage = Self::new(builder.init().await?);
        storage.init().await?;
        Ok(storage)
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}

/// Maps a failed statement to [`StorageError::Conflict`] when a unique index rejected it.
fn classify(source: surrealdb::Error, what: &'static str) -> StorageError {
    if source.to_string().contains(UNIQUE_VIOLATION) {
        StorageError::Conflict { message: Cow::Borrowed(what), context: None }
    } else {
        StorageError::Surreal { source, context: Some(Cow::Borrowed(what)) }
    }
}

impl StorageProvider for SurrealStorage {
    #[instrument(skip(self), fields(ns = self.db.namespace(), db = self.db.database()))]
    async fn init(&self) -> Result<(), StorageError> {
        self.db
            .query(schema::SCHEMA)
            .await
            .context("Applying schema")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Applying schema")?;

        debug!("Storage schema applied");
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<(), StorageError> {
        self.db
            .query(schema::CREATE_ACCOUNT)
            .bind(("username", username.to_owned()))
            .bind(("password_hash", password_hash.to_owned()))
            .await
            .context("Creating account")?
            .check()
            .map_err(|e| classify(surrealdb::Error::from(e), "username already exists"))?;

        Ok(())
    }

    async fn exist_user(&self, username: &str, password_hash: &str) -> Result<bool, StorageError> {
        let rows = self
            .db
            .query(schema::FIND_ACCOUNT)
            .bind(("username", username.to_owned()))
            .bind(("password_hash", password_hash.to_owned()))
            .await
            .context("Looking up account")?
            .take::<Vec<UsernameRow>>(0)
            .context("Parsing account rows")?;

        Ok(!rows.is_empty())
    }

    async fn titles_by_user(&self, username: &str) -> Result<Vec<String>, StorageError> {
        let rows = self
            .db
            .query(schema::LIST_TITLES)
            .bind(("owner", username.to_owned()))
            .await
            .context("Listing titles")?
            .take::<Vec<TitleRow>>(0)
            .context("Parsing title rows")?;

        Ok(rows.into_iter().map(|row| row.title).collect())
    }

    async fn get_data(&self, username: &str, title: &str) -> Result<String, StorageError> {
        let rows = self
            .db
            .query(schema::GET_ENVELOPE)
            .bind(("owner", username.to_owned()))
            .bind(("title", title.to_owned()))
            .await
            .context("Loading record")?
            .take::<Vec<EnvelopeRow>>(0)
            .context("Parsing record rows")?;

        rows.into_iter().next().map(|row| row.envelope).ok_or_else(|| StorageError::NotFound {
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
        self.db
            .query(schema::CREATE_RECORD)
            .bind(("owner", username.to_owned()))
            .bind(("title", title.to_owned()))
            .bind(("kind", kind.to_string()))
            .bind(("envelope", envelope.to_owned()))
            .await
            .context("Creating record")?
            .check()
            .map_err(|e| classify(surrealdb::Error::from(e), "record title already exists"))?;

        Ok(())
    }

    async fn add_client(
        &self,
        client_id: &str,
        username: &str,
        state: SessionState,
    ) -> Result<(), StorageError> {
        self.db
            .query(schema::CREATE_CLIENT)
            .bind(("client_id", client_id.to_owned()))
            .bind(("username", username.to_owned()))
            .bind(("state", state.to_string()))
            .await
            .context("Mirroring session")?
            .check()
            .map_err(|e| classify(surrealdb::Error::from(e), "client id already exists"))?;

        Ok(())
    }

    async fn update_client_state(
        &self,
        client_id: &str,
        state: SessionState,
    ) -> Result<(), StorageError> {
        self.db
            .query(schema::UPDATE_CLIENT)
            .bind(("client_id", client_id.to_owned()))
            .bind(("state", state.to_string()))
            .await
            .context("Updating session mirror")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Updating session mirror")?;

        Ok(())
    }

    async fn remove_client(&self, client_id: &str) -> Result<(), StorageError> {
        self.db
            .query(schema::DELETE_CLIENT)
            .bind(("client_id", client_id.to_owned()))
            .await
            .context("Removing session mirror")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Removing session mirror")?;

        Ok(())
    }

    async fn all_clients(&self) -> Result<Vec<ClientRecord>, StorageError> {
        let rows = self
            .db
            .query(schema::LIST_CLIENTS)
            .await
            .context("Listing session mirrors")?
            .take::<Vec<ClientRow>>(0)
            .context("Parsing session mirror rows")?;

        rows.into_iter()
            .map(|row| {
                let state = row.state.parse::<SessionState>().map_err(|_| {
                    StorageError::Internal {
                        message: format!("unknown session state '{}'", row.state).into(),
                        context: Some(format!("client_id={}", row.client_id).into()),
                    }
                })?;
                Ok(ClientRecord { client_id: row.client_id, username: row.username, state })
            })
            .collect()
    }
}
