//! Process-wide cancellation signal.
//!
//! One [`Shutdown`] is created at startup and cloned into every component that runs loops.
//! Each loop holds its own [`ShutdownListener`] and selects on [`ShutdownListener::recv`].

use std::sync::Arc;
use tokio::sync::watch;

/// Trigger side of the shutdown signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal. Later calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Creates a listener that resolves once the signal fires.
    #[must_use]
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener { rx: self.tx.subscribe() }
    }
}

/// Receiving side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Waits until shutdown is triggered. Returns immediately if it already was.
    ///
    /// A dropped trigger counts as shutdown.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}
