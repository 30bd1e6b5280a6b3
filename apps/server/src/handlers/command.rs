use crate::state::ApiState;
use crate::transport::{WsSink, WsStream};
use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::StreamExt;
use keeper_domain::constants::SESSION_TAG;
use std::sync::Arc;
use tracing::{debug, warn};

#[utoipa::path(
    get,
    path = "/api/v1/command",
    responses(
        (status = SWITCHING_PROTOCOLS, description = "WebSocket stream of CommandMessage JSON text frames"),
    ),
    tag = SESSION_TAG,
)]
pub(crate) async fn command_handler(
    State(state): State<ApiState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| run(state, socket))
}

async fn run(state: ApiState, socket: WebSocket) {
    let (sink, stream) = socket.split();
    let result = keeper_session::serve(
        Arc::clone(&state.engine),
        WsStream::new(stream),
        WsSink::new(sink),
        state.shutdown.subscribe(),
    )
    .await;

    match result {
        Ok(()) => debug!("Command stream finished"),
        Err(e) => warn!(error = %e, "Command stream ended with an error"),
    }
}
