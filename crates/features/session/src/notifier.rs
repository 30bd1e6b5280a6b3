use crate::registry::SessionRegistry;
use crate::session::SessionHandle;
use crate::texts;
use keeper_database::StorageProvider;
use keeper_domain::config::SessionConfig;
use keeper_domain::protocol::CommandMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pushes "new record" notices to the creator's other sessions.
#[derive(Debug)]
pub struct Notifier<S: StorageProvider> {
    registry: Arc<SessionRegistry<S>>,
    attempts: u32,
    backoff: Duration,
}

impl<S: StorageProvider> Clone for Notifier<S> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry), attempts: self.attempts, backoff: self.backoff }
    }
}

impl<S: StorageProvider> Notifier<S> {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry<S>>, config: &SessionConfig) -> Self {
        Self {
            registry,
            attempts: config.broadcast_attempts.max(1),
            backoff: Duration::from_millis(config.broadcast_backoff_ms),
        }
    }

    /// Announces `title` to every session of `owner` except `exclude_id`.
    ///
    /// Runs detached; the handle resolves to the number of sessions reached.
    pub fn record_created(&self, owner: &str, exclude_id: &str, title: &str) -> JoinHandle<usize> {
        let mut recipients = Vec::new();
        self.registry.for_each_other_session(owner, exclude_id, |session| {
            recipients.push(Arc::clone(session));
        });

        let notice = CommandMessage::from_server(texts::record_created(title));
        let (attempts, backoff) = (self.attempts, self.backoff);

        tokio::spawn(async move {
            let mut delivered = 0;
            for session in recipients {
                if deliver(&session, notice.clone(), attempts, backoff).await {
                    delivered += 1;
                }
            }
            debug!(delivered, "Broadcast finished");
            delivered
        })
    }
}

async fn deliver(
    session: &SessionHandle,
    mut notice: CommandMessage,
    attempts: u32,
    backoff: Duration,
) -> bool {
    for attempt in 1..=attempts {
        match session.try_send(notice) {
            Ok(()) => return true,
            Err(TrySendError::Closed(_)) => {
                debug!(client_id = session.client_id(), "Skipping terminated session");
                return false;
            }
            Err(TrySendError::Full(returned)) => {
                notice = returned;
                if attempt < attempts {
                    tokio::time::sleep(backoff * attempt).await;
                }
            }
        }
    }

    warn!(client_id = session.client_id(), attempts, "Outbound queue full, notice dropped");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_database::MemoryStorage;

    fn config() -> SessionConfig {
        SessionConfig { outbound_capacity: 1, broadcast_attempts: 2, broadcast_backoff_ms: 1 }
    }

    #[tokio::test]
    async fn full_queue_drops_after_retries() {
        let registry = Arc::new(SessionRegistry::new(MemoryStorage::new()));
        let (creator, _creator_queue) = SessionHandle::new("alice::1", "alice", 1);
        let (sibling, mut sibling_queue) = SessionHandle::new("alice::2", "alice", 1);
        registry.register(creator).await.unwrap();
        registry.register(Arc::clone(&sibling)).await.unwrap();

        sibling.try_send(CommandMessage::from_server("busy")).unwrap();

        let notifier = Notifier::new(Arc::clone(&registry), &config());
        let delivered = notifier.record_created("alice", "alice::1", "mail").await.unwrap();
        assert_eq!(delivered, 0);

        assert_eq!(sibling_queue.recv().await.map(|m| m.message), Some("busy".to_owned()));
        assert!(sibling_queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn terminated_sibling_is_skipped() {
        let registry = Arc::new(SessionRegistry::new(MemoryStorage::new()));
        let (sibling, _queue) = SessionHandle::new("alice::2", "alice", 4);
        registry.register(Arc::clone(&sibling)).await.unwrap();
        sibling.terminate();

        let notifier = Notifier::new(registry, &config());
        assert_eq!(notifier.record_created("alice", "alice::1", "mail").await.unwrap(), 0);
    }
}
