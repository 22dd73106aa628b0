//! Transport-neutral frames exchanged with a WebSocket.

/// Close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code sent when the server is going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Close code for a protocol or policy violation.
pub const CLOSE_POLICY: u16 = 1008;

/// A frame read from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame; not part of the protocol.
    Binary,
    /// Ping or pong; answered by the transport.
    Control,
    /// Peer close frame.
    Close,
    /// Read failure.
    Error(String),
}

/// A frame queued for the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// UTF-8 text frame.
    Text(String),
    /// Close frame; the writer stops after sending it.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

impl Outbound {
    /// Build a close frame.
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close {
            code,
            reason: reason.into(),
        }
    }
}
