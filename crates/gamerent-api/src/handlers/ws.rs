//! WebSocket upgrade handler.
//!
//! Authentication happens inside the socket: the first frame must be an
//! `authorization` message, which the real-time gateway validates.

use std::future::ready;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use gamerent_realtime::{Inbound, Outbound};

use crate::state::AppState;

/// GET /ws
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

fn to_frame(outbound: Outbound) -> Message {
    match outbound {
        Outbound::Text(text) => Message::Text(text.into()),
        Outbound::Close { code, reason } => Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })),
    }
}

fn from_frame(frame: Result<Message, axum::Error>) -> Inbound {
    match frame {
        Ok(Message::Text(text)) => Inbound::Text(text.to_string()),
        Ok(Message::Binary(_)) => Inbound::Binary,
        Ok(Message::Ping(_) | Message::Pong(_)) => Inbound::Control,
        Ok(Message::Close(_)) => Inbound::Close,
        Err(e) => Inbound::Error(e.to_string()),
    }
}

/// Adapts the socket halves to the gateway's transport types and serves it.
async fn handle_socket(state: AppState, socket: WebSocket) {
    if state.realtime.is_shutting_down() {
        return;
    }
    debug!("WebSocket upgraded");

    let (ws_tx, ws_rx) = socket.split();
    let sink = ws_tx.with(|outbound: Outbound| ready(Ok::<_, axum::Error>(to_frame(outbound))));
    let stream = ws_rx.map(from_frame);

    state.realtime.gateway.serve(sink, stream).await;
}
