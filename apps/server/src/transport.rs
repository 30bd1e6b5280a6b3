//! WebSocket halves as command transports.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use keeper_domain::protocol::CommandMessage;
use keeper_session::{TransportError, TransportSink, TransportStream};

/// Read half: decodes JSON text frames into envelopes.
#[derive(Debug)]
pub struct WsStream {
    inner: SplitStream<WebSocket>,
}

impl WsStream {
    #[must_use]
    pub const fn new(inner: SplitStream<WebSocket>) -> Self {
        Self { inner }
    }
}

impl TransportStream for WsStream {
    async fn recv(&mut self) -> Result<Option<CommandMessage>, TransportError> {
        loop {
            let Some(frame) = self.inner.next().await else { return Ok(None) };
            let frame = frame.map_err(|e| TransportError::Io {
                message: e.to_string().into(),
                context: Some("websocket read".into()),
            })?;

            match frame {
                Message::Text(text) => return decode(text.as_str()).map(Some),
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
            }
        }
    }
}

/// Write half: encodes envelopes as JSON text frames.
#[derive(Debug)]
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    #[must_use]
    pub const fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

impl TransportSink for WsSink {
    async fn send(&mut self, message: CommandMessage) -> Result<(), TransportError> {
        let text = serde_json::to_string(&message).map_err(|e| TransportError::Protocol {
            message: e.to_string().into(),
            context: Some("encode envelope".into()),
        })?;

        self.inner.send(Message::Text(text.into())).await.map_err(|e| TransportError::Io {
            message: e.to_string().into(),
            context: Some("websocket write".into()),
        })
    }
}

pub(crate) fn decode(text: &str) -> Result<CommandMessage, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::Protocol {
        message: e.to_string().into(),
        context: Some("decode envelope".into()),
    })
}
