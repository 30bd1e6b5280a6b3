use crate::error::SessionError;
use crate::session::SessionHandle;
use fxhash::FxHashMap;
use keeper_database::StorageProvider;
use keeper_domain::session::SessionState;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// In-process set of live sessions, mirrored best-effort into storage.
///
/// The map lock is never held across an `.await`; storage calls happen after it is released.
#[derive(Debug)]
pub struct SessionRegistry<S: StorageProvider> {
    sessions: Mutex<FxHashMap<String, Arc<SessionHandle>>>,
    storage: S,
}

impl<S: StorageProvider> SessionRegistry<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { sessions: Mutex::new(FxHashMap::default()), storage }
    }

    /// Adds a session.
    ///
    /// # Errors
    /// [`SessionError::Conflict`] if the client id is already registered. Mirror failures are
    /// only logged.
    #[instrument(skip_all, fields(client_id = session.client_id()))]
    pub async fn register(&self, session: Arc<SessionHandle>) -> Result<(), SessionError> {
        {
            let mut sessions = self.sessions.lock();
            if sessions.contains_key(session.client_id()) {
                return Err(SessionError::Conflict {
                    message: "client id already registered".into(),
                    context: Some(session.client_id().to_owned().into()),
                });
            }
            sessions.insert(session.client_id().to_owned(), Arc::clone(&session));
        }

        if let Err(e) = self
            .storage
            .add_client(session.client_id(), session.username(), session.state())
            .await
        {
            warn!(error = %e, "Failed to mirror session");
        }

        info!(username = session.username(), "Session registered");
        Ok(())
    }

    /// Removes a session, terminating it and closing its outbound queue.
    ///
    /// Returns `false` without touching storage when the id is unknown.
    #[instrument(skip(self))]
    pub async fn remove(&self, client_id: &str) -> bool {
        let Some(session) = self.sessions.lock().remove(client_id) else {
            return false;
        };

        session.terminate();

        if let Err(e) = self.storage.remove_client(client_id).await {
            warn!(error = %e, "Failed to remove session mirror");
        }

        info!(username = session.username(), "Session removed");
        true
    }

    /// Records a new protocol state for a session.
    pub async fn update_state(&self, client_id: &str, state: SessionState) {
        let Some(session) = self.get(client_id) else {
            return;
        };
        session.set_state(state);

        if let Err(e) = self.storage.update_client_state(client_id, state).await {
            warn!(client_id, %state, error = %e, "Failed to mirror session state");
        }
    }

    /// Calls `f` for every session of `owner` except `exclude_id`, under the registry lock.
    ///
    /// `f` must not block or re-enter the registry.
    pub fn for_each_other_session<F>(&self, owner: &str, exclude_id: &str, mut f: F)
    where
        F: FnMut(&Arc<SessionHandle>),
    {
        self.sessions
            .lock()
            .values()
            .filter(|session| session.username() == owner && session.client_id() != exclude_id)
            .for_each(|session| f(session));
    }

    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().get(client_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    #[must_use]
    pub fn contains(&self, client_id: &str) -> bool {
        self.sessions.lock().contains_key(client_id)
    }

    #[must_use]
    pub fn client_ids(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }

    /// Purges mirror rows left behind by a previous process.
    ///
    /// Their transports died with that process, so they are dropped rather than reloaded.
    /// Returns the number of rows purged.
    ///
    /// # Errors
    /// [`SessionError::Storage`] if the mirror cannot be listed.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> Result<usize, SessionError> {
        let stale = self.storage.all_clients().await?;
        let mut purged = 0;

        for client in stale.into_iter().filter(|client| !self.contains(&client.client_id)) {
            debug!(client_id = %client.client_id, state = %client.state, "Purging stale session");
            match self.storage.remove_client(&client.client_id).await {
                Ok(()) => purged += 1,
                Err(e) => warn!(client_id = %client.client_id, error = %e, "Failed to purge session"),
            }
        }

        if purged > 0 {
            info!(purged, "Stale sessions purged");
        }
        Ok(purged)
    }

    /// Terminates every live session without deregistering it.
    pub fn terminate_all(&self) {
        self.sessions.lock().values().for_each(|session| session.terminate());
    }
}
