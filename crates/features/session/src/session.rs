use crate::error::SessionError;
use keeper_domain::protocol::CommandMessage;
use keeper_domain::session::SessionState;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

/// One live command session.
///
/// The handle owns the sending side of the session's bounded outbound queue and its
/// termination signal. The receiving side goes to the writer task returned by
/// [`SessionHandle::new`].
#[derive(Debug)]
pub struct SessionHandle {
    client_id: String,
    username: String,
    state: Mutex<SessionState>,
    outbound: mpsc::Sender<CommandMessage>,
    terminate: watch::Sender<bool>,
}

impl SessionHandle {
    /// Creates a session in `HANDSHAKE` and the receiver of its outbound queue.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        username: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<CommandMessage>) {
        let (outbound, queue) = mpsc::channel(capacity.max(1));
        let (terminate, _) = watch::channel(false);
        let handle = Self {
            client_id: client_id.into(),
            username: username.into(),
            state: Mutex::new(SessionState::Handshake),
            outbound,
            terminate,
        };
        (Arc::new(handle), queue)
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    /// Queues a reply, waiting for room when the queue is full.
    ///
    /// # Errors
    /// [`SessionError::Internal`] once the session is terminated or its writer is gone.
    pub async fn send(&self, message: CommandMessage) -> Result<(), SessionError> {
        if self.is_terminated() {
            return Err(self.closed());
        }
        self.outbound.send(message).await.map_err(|_| self.closed())
    }

    /// Queues a message only if there is room right now.
    ///
    /// A terminated session reports [`TrySendError::Closed`].
    pub fn try_send(&self, message: CommandMessage) -> Result<(), TrySendError<CommandMessage>> {
        if self.is_terminated() {
            return Err(TrySendError::Closed(message));
        }
        self.outbound.try_send(message)
    }

    /// Fires the termination signal. Later calls are no-ops.
    pub fn terminate(&self) {
        self.terminate.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        *self.terminate.borrow()
    }

    /// Receiver that observes the termination signal.
    #[must_use]
    pub fn terminated(&self) -> watch::Receiver<bool> {
        self.terminate.subscribe()
    }

    fn closed(&self) -> SessionError {
        SessionError::Internal {
            message: "session is closed".into(),
            context: Some(format!("client_id={}", self.client_id).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminated_session_refuses_messages() {
        let (session, mut queue) = SessionHandle::new("alice::1", "alice", 4);
        assert_eq!(session.state(), SessionState::Handshake);

        session.send(CommandMessage::from_server("one")).await.unwrap();
        session.terminate();
        session.terminate();

        assert!(session.send(CommandMessage::from_server("two")).await.is_err());
        assert!(matches!(
            session.try_send(CommandMessage::from_server("three")),
            Err(TrySendError::Closed(_))
        ));
        assert_eq!(queue.recv().await.map(|m| m.message), Some("one".to_owned()));
        assert!(queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_rejects_try_send() {
        let (session, _queue) = SessionHandle::new("alice::1", "alice", 1);
        session.try_send(CommandMessage::from_server("one")).unwrap();
        assert!(matches!(
            session.try_send(CommandMessage::from_server("two")),
            Err(TrySendError::Full(_))
        ));
    }

    #[test]
    fn termination_is_observable() {
        let (session, _queue) = SessionHandle::new("alice::1", "alice", 1);
        let observer = session.terminated();
        assert!(!*observer.borrow());
        session.terminate();
        assert!(*observer.borrow());
        assert!(session.is_terminated());
    }
}
