use crate::error::SessionError;
use crate::machine::{Machine, Outcome, Request};
use crate::notifier::Notifier;
use crate::registry::SessionRegistry;
use crate::session::SessionHandle;
use crate::texts;
use keeper_database::StorageProvider;
use keeper_domain::config::SessionConfig;
use keeper_domain::constants::CLIENT_ID_DELIMITER;
use keeper_domain::protocol::CommandMessage;
use keeper_kernel::safe_nanoid;
use keeper_vault::Vault;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Shared services behind every command session.
#[derive(Debug)]
pub struct SessionEngine<S: StorageProvider> {
    storage: S,
    vault: Vault,
    registry: Arc<SessionRegistry<S>>,
    notifier: Notifier<S>,
    config: SessionConfig,
}

impl<S: StorageProvider> SessionEngine<S> {
    #[must_use]
    pub fn new(storage: S, vault: Vault, config: SessionConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(storage.clone()));
        let notifier = Notifier::new(Arc::clone(&registry), &config);
        Self { storage, vault, registry, notifier, config }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<SessionRegistry<S>> {
        &self.registry
    }

    /// Performs the handshake for `username`: allocates a client id, registers the session
    /// and returns the conversation plus the receiver of its outbound queue.
    ///
    /// # Errors
    /// * [`SessionError::Format`] for a blank username.
    /// * [`SessionError::Conflict`] if the generated client id is taken.
    #[instrument(skip(self))]
    pub async fn open(
        self: &Arc<Self>,
        username: &str,
    ) -> Result<(Conversation<S>, mpsc::Receiver<CommandMessage>), SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::Format {
                message: "username cannot be empty".into(),
                context: Some("Handshake".into()),
            });
        }

        let client_id = format!("{username}{CLIENT_ID_DELIMITER}{}", safe_nanoid!());
        let (session, queue) =
            SessionHandle::new(client_id, username, self.config.outbound_capacity);
        self.registry.register(Arc::clone(&session)).await?;

        let conversation =
            Conversation { engine: Arc::clone(self), session, machine: Machine::new() };
        Ok((conversation, queue))
    }
}

/// Protocol state of one connection after its handshake.
///
/// Only the connection's consumer loop drives a conversation, so payloads are processed
/// strictly in arrival order.
#[derive(Debug)]
pub struct Conversation<S: StorageProvider> {
    engine: Arc<SessionEngine<S>>,
    session: Arc<SessionHandle>,
    machine: Machine,
}

impl<S: StorageProvider> Conversation<S> {
    #[must_use]
    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        self.session.client_id()
    }

    /// Shows the main menu after the handshake.
    ///
    /// # Errors
    /// Fails only if the session is already closed.
    pub async fn greet(&mut self) -> Result<(), SessionError> {
        let replies = self.machine.greet();
        self.sync_state().await;
        self.reply(replies).await
    }

    /// Processes one inbound payload.
    ///
    /// Input, codec and storage failures are answered inline; only a closed session is an
    /// error.
    #[instrument(skip_all, fields(client_id = self.session.client_id()))]
    pub async fn handle(&mut self, input: &str) -> Result<(), SessionError> {
        debug!(state = %self.machine.state(), "Command received");
        let step = self.machine.feed(input);
        self.reply(step.replies).await?;

        if let Some(request) = step.request {
            let created = match &request {
                Request::Store { draft } => Some(draft.title.clone()),
                _ => None,
            };

            let outcome = self.perform(request).await;
            let stored = matches!(outcome, Outcome::Stored);
            let replies = self.machine.resume(outcome);
            self.reply(replies).await?;

            if let Some(title) = created.filter(|_| stored) {
                self.engine.notifier.record_created(
                    self.session.username(),
                    self.session.client_id(),
                    &title,
                );
            }
        }

        self.sync_state().await;
        Ok(())
    }

    /// Answers a frame that could not be decoded. The protocol state is left untouched, so the
    /// user can retry the current step.
    ///
    /// # Errors
    /// Fails only if the session is already closed.
    pub async fn reject(&self) -> Result<(), SessionError> {
        self.reply(vec![texts::INVALID_MESSAGE.to_owned()]).await
    }

    /// Deregisters the session. Safe to call more than once.
    pub async fn close(&self) -> bool {
        self.engine.registry.remove(self.session.client_id()).await
    }

    async fn perform(&self, request: Request) -> Outcome {
        let owner = self.session.username();
        let engine = &self.engine;

        let result: Result<Outcome, SessionError> = match request {
            Request::ListTitles => {
                engine.storage.titles_by_user(owner).await.map(Outcome::Titles).map_err(Into::into)
            }
            Request::Fetch { title } => match engine.storage.get_data(owner, &title).await {
                Ok(envelope) => engine.vault.decode(envelope).map(Outcome::Record).map_err(Into::into),
                Err(e) => Err(SessionError::from(e)),
            },
            Request::Store { draft } => match engine.vault.encode(draft.kind, &draft.values) {
                Ok(envelope) => engine
                    .storage
                    .create_data(owner, &draft.title, draft.kind, &envelope)
                    .await
                    .map(|()| Outcome::Stored)
                    .map_err(Into::into),
                Err(e) => Err(SessionError::from(e)),
            },
        };

        result.unwrap_or_else(|e| {
            if !(e.is_conflict() || e.is_format()) {
                warn!(client_id = self.session.client_id(), error = %e, "Request failed");
            }
            Outcome::Failed(e)
        })
    }

    async fn reply(&self, replies: Vec<String>) -> Result<(), SessionError> {
        for text in replies {
            self.session.send(CommandMessage::from_server(text)).await?;
        }
        Ok(())
    }

    async fn sync_state(&self) {
        let state = self.machine.state();
        if self.session.state() != state {
            self.engine.registry.update_state(self.session.client_id(), state).await;
        }
    }
}
