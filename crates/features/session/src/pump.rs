//! Moves envelopes between a transport and a [`Conversation`].
//!
//! Every connection gets a reader task feeding a single-consumer inbox, the consumer loop
//! (run by [`serve`] on the caller's task) and, after the handshake, a writer task draining
//! the session's outbound queue into the transport.

use crate::engine::{Conversation, SessionEngine};
use crate::error::{SessionError, SessionErrorExt, TransportError};
use crate::session::SessionHandle;
use crate::texts;
use keeper_database::StorageProvider;
use keeper_domain::protocol::CommandMessage;
use keeper_kernel::ShutdownListener;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const INBOX_CAPACITY: usize = 32;

type Frame = Result<Option<CommandMessage>, TransportError>;

/// Read half of a command transport.
pub trait TransportStream: Send + 'static {
    /// Next envelope; `Ok(None)` once the peer has closed the stream.
    fn recv(&mut self) -> impl Future<Output = Frame> + Send;
}

/// Write half of a command transport.
pub trait TransportSink: Send + 'static {
    fn send(
        &mut self,
        message: CommandMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Runs one connection until EOF, a transport error or shutdown.
///
/// The session, once opened, is always deregistered before this returns.
///
/// # Errors
/// [`SessionError::Transport`] when the read side fails with an I/O error or a reply cannot be
/// written.
pub async fn serve<S, R, W>(
    engine: Arc<SessionEngine<S>>,
    stream: R,
    sink: W,
    shutdown: ShutdownListener,
) -> Result<(), SessionError>
where
    S: StorageProvider,
    R: TransportStream,
    W: TransportSink,
{
    let (inbox_tx, mut inbox) = mpsc::channel(INBOX_CAPACITY);
    let reader = spawn_reader(stream, inbox_tx, shutdown.clone());

    let result = match handshake(&engine, &mut inbox, sink, shutdown.clone()).await {
        Ok(Some((mut conversation, writer))) => {
            let result = converse(&mut conversation, &mut inbox, shutdown).await;
            conversation.close().await;
            if writer.await.is_err() {
                warn!(client_id = conversation.client_id(), "Writer task panicked");
            }
            result
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    reader.abort();
    result
}

/// Waits for the first envelope and opens the session.
///
/// A blank username is answered directly on the sink and the connection keeps waiting.
async fn handshake<S, W>(
    engine: &Arc<SessionEngine<S>>,
    inbox: &mut mpsc::Receiver<Frame>,
    mut sink: W,
    mut shutdown: ShutdownListener,
) -> Result<Option<(Conversation<S>, JoinHandle<()>)>, SessionError>
where
    S: StorageProvider,
    W: TransportSink,
{
    loop {
        let frame = tokio::select! {
            biased;
            () = shutdown.recv() => return Ok(None),
            frame = inbox.recv() => frame,
        };

        let message = match frame {
            Some(Ok(Some(message))) => message,
            None | Some(Ok(None)) => return Ok(None),
            Some(Err(e)) if e.is_recoverable() => {
                debug!(error = %e, "Malformed handshake frame");
                sink.send(CommandMessage::from_server(texts::INVALID_MESSAGE))
                    .await
                    .context("Rejecting handshake")?;
                continue;
            }
            Some(Err(e)) => return Err(e).context("Awaiting handshake"),
        };

        match engine.open(&message.username).await {
            Ok((conversation, queue)) => {
                let writer = spawn_writer(conversation.session(), queue, sink, shutdown);
                return Ok(Some((conversation, writer)));
            }
            Err(e) if e.is_format() => {
                debug!(error = %e, "Handshake rejected");
                sink.send(CommandMessage::from_server(texts::EMPTY_USERNAME))
                    .await
                    .context("Rejecting handshake")?;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn converse<S: StorageProvider>(
    conversation: &mut Conversation<S>,
    inbox: &mut mpsc::Receiver<Frame>,
    mut shutdown: ShutdownListener,
) -> Result<(), SessionError> {
    conversation.greet().await?;

    loop {
        let frame = tokio::select! {
            biased;
            () = shutdown.recv() => {
                info!(client_id = conversation.client_id(), "Session closed by shutdown");
                return Ok(());
            }
            frame = inbox.recv() => frame,
        };

        match frame {
            Some(Ok(Some(message))) => conversation.handle(&message.message).await?,
            Some(Err(e)) if e.is_recoverable() => {
                debug!(client_id = conversation.client_id(), error = %e, "Malformed frame");
                conversation.reject().await?;
            }
            None | Some(Ok(None)) => {
                info!(client_id = conversation.client_id(), "Peer closed the stream");
                return Ok(());
            }
            Some(Err(e)) => {
                warn!(client_id = conversation.client_id(), error = %e, "Transport failed");
                return Err(e).context("Reading command");
            }
        }
    }
}

fn spawn_reader<R: TransportStream>(
    mut stream: R,
    inbox: mpsc::Sender<Frame>,
    mut shutdown: ShutdownListener,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = shutdown.recv() => break,
                frame = stream.recv() => {
                    let last = match &frame {
                        Ok(Some(_)) => false,
                        Ok(None) => true,
                        Err(e) => !e.is_recoverable(),
                    };
                    if inbox.send(frame).await.is_err() || last {
                        break;
                    }
                }
            }
        }
    })
}

fn spawn_writer<W: TransportSink>(
    session: &SessionHandle,
    mut queue: mpsc::Receiver<CommandMessage>,
    mut sink: W,
    mut shutdown: ShutdownListener,
) -> JoinHandle<()> {
    let mut terminated = session.terminated();
    let client_id = session.client_id().to_owned();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = fired(&mut terminated) => break,
                () = shutdown.recv() => break,
                message = queue.recv() => {
                    let Some(message) = message else { break };
                    if let Err(e) = sink.send(message).await {
                        warn!(%client_id, error = %e, "Failed to write message");
                    }
                }
            }
        }
        queue.close();
        debug!(%client_id, "Writer stopped");
    })
}

async fn fired(signal: &mut watch::Receiver<bool>) {
    let _ = signal.wait_for(|fired| *fired).await;
}
