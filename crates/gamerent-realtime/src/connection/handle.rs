//! Individual WebSocket connection handle.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

use gamerent_core::error::TransportError;

use super::frame::Outbound;
use crate::message::Message;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single authenticated WebSocket connection.
///
/// Writes go through a bounded queue drained by the connection's writer
/// task; they never block. Releasing the handle tells both the writer and
/// the session loop to drop the transport.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Identity that authenticated this connection.
    pub identity: String,
    /// When the connection was admitted.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Outbound>,
    released: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle writing into `sender`.
    pub fn new(identity: impl Into<String>, sender: mpsc::Sender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            connected_at: Utc::now(),
            sender,
            released: CancellationToken::new(),
        }
    }

    /// Enqueue a frame without waiting.
    ///
    /// A full queue is a failed write; a closed queue means the peer is gone.
    pub fn send(&self, frame: Outbound) -> Result<(), TransportError> {
        if self.is_released() {
            return Err(TransportError::Disconnected);
        }
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::WriteFailed,
            TrySendError::Closed(_) => TransportError::Disconnected,
        })
    }

    /// Enqueue an encoded message.
    pub fn send_message(&self, message: &Message) -> Result<(), TransportError> {
        self.send(Outbound::Text(message.encode()))
    }

    /// Stop the writer and the session loop, dropping the transport.
    pub fn release(&self) {
        self.released.cancel();
    }

    /// Whether the transport was released.
    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    /// Resolves once the transport is released.
    pub fn released(&self) -> WaitForCancellationFuture<'_> {
        self.released.cancelled()
    }

    /// Owned release signal, for tasks that outlive a borrow of the handle.
    pub fn release_token(&self) -> CancellationToken {
        self.released.clone()
    }
}
