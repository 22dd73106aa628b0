//! Per-connection session gateway.
//!
//! A session moves through [`SessionState`]:
//! `AwaitingHandshake -> Authenticated -> Active -> Closed`.
//! The first frame must be an `authorization` message carrying a valid
//! token; anything else closes the connection after a best-effort error
//! notice. Once active, inbound messages are stamped with the sender's
//! identity and fanned out to every connection of that identity.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gamerent_auth::SessionTokenManager;
use gamerent_core::config::realtime::RealtimeConfig;
use gamerent_core::error::{AuthError, ProtocolError};

use crate::connection::frame::CLOSE_POLICY;
use crate::connection::{ConnectionHandle, ConnectionId, ConnectionRegistry, Inbound, Outbound};
use crate::dispatch::{Audience, BroadcastDispatcher};
use crate::message::{Message, MessageBody, MessageKind};
use crate::notifier::spawn_notifier;

/// Notice for frames that are not a decodable message.
pub const INVALID_FORMAT: &str = "Invalid message format";
/// Notice for a message of the wrong kind for the session state.
pub const INVALID_TYPE: &str = "Invalid message type";
/// Notice for a missing, invalid, expired or revoked token.
pub const INVALID_TOKEN: &str = "Invalid token";
/// Notice when no handshake arrives in time.
pub const HANDSHAKE_TIMEOUT: &str = "Handshake timed out";

/// Gateway tuning, derived from [`RealtimeConfig`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How long a new connection may take to authenticate.
    pub handshake_timeout: Duration,
    /// Notifier period; `None` disables notifications.
    pub notification_period: Option<Duration>,
    /// Outbound queue capacity per connection.
    pub channel_buffer: usize,
}

impl From<&RealtimeConfig> for GatewayConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            handshake_timeout: Duration::from_secs(config.handshake_timeout_seconds),
            notification_period: config
                .notifications
                .enabled
                .then(|| Duration::from_secs(config.notifications.interval_seconds)),
            channel_buffer: config.channel_buffer_size.max(1),
        }
    }
}

/// Lifecycle of one connection.
#[derive(Debug)]
pub enum SessionState {
    /// Waiting for the authorization message.
    AwaitingHandshake,
    /// Token accepted; not yet admitted.
    Authenticated {
        /// Resolved identity.
        identity: String,
    },
    /// Admitted and dispatching.
    Active {
        /// The registered connection.
        connection: Arc<ConnectionHandle>,
    },
    /// Terminal.
    Closed,
}

/// Why a handshake did not produce an identity.
#[derive(Debug)]
enum HandshakeFailure {
    Protocol(ProtocolError),
    Auth(AuthError),
    Disconnected,
}

impl HandshakeFailure {
    fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Protocol(ProtocolError::MalformedMessage(_)) => Some(INVALID_FORMAT),
            Self::Protocol(ProtocolError::UnexpectedFirstMessage(_)) => Some(INVALID_TYPE),
            Self::Protocol(ProtocolError::HandshakeTimeout) => Some(HANDSHAKE_TIMEOUT),
            Self::Auth(_) => Some(INVALID_TOKEN),
            Self::Disconnected => None,
        }
    }
}

impl fmt::Display for HandshakeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => e.fmt(f),
            Self::Auth(e) => e.fmt(f),
            Self::Disconnected => f.write_str("peer disconnected"),
        }
    }
}

/// Orchestrates handshake, admission, dispatch and teardown.
#[derive(Debug, Clone)]
pub struct RealtimeGateway {
    registry: Arc<ConnectionRegistry>,
    dispatcher: BroadcastDispatcher,
    tokens: Arc<SessionTokenManager>,
    config: GatewayConfig,
    shutdown: CancellationToken,
}

impl RealtimeGateway {
    /// Create a gateway.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: BroadcastDispatcher,
        tokens: Arc<SessionTokenManager>,
        config: GatewayConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            tokens,
            config,
            shutdown,
        }
    }

    /// Drive one connection until it closes.
    ///
    /// `sink` moves into the connection's writer task once the session is
    /// admitted; `stream` is read by the calling task.
    pub async fn serve<Si, St>(&self, sink: Si, mut stream: St)
    where
        Si: Sink<Outbound> + Send + Unpin + 'static,
        Si::Error: fmt::Display,
        St: Stream<Item = Inbound> + Send + Unpin,
    {
        let mut sink = Some(sink);
        let mut state = SessionState::AwaitingHandshake;

        loop {
            state = match state {
                SessionState::AwaitingHandshake => match self.handshake(&mut stream).await {
                    Ok(identity) => SessionState::Authenticated { identity },
                    Err(failure) => {
                        if let Some(sink) = sink.as_mut() {
                            reject(sink, &failure).await;
                        }
                        SessionState::Closed
                    }
                },
                SessionState::Authenticated { identity } => match sink.take() {
                    Some(sink) => match self.activate(identity, sink).await {
                        Some(connection) => SessionState::Active { connection },
                        None => SessionState::Closed,
                    },
                    None => SessionState::Closed,
                },
                SessionState::Active { connection } => {
                    self.run_active(&connection, &mut stream).await;
                    self.registry.retire(connection.id).await;
                    info!(
                        conn_id = %connection.id,
                        identity = %connection.identity,
                        "WebSocket session closed"
                    );
                    SessionState::Closed
                }
                SessionState::Closed => break,
            };
        }
    }

    async fn handshake<St>(&self, stream: &mut St) -> Result<String, HandshakeFailure>
    where
        St: Stream<Item = Inbound> + Unpin,
    {
        let first = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(HandshakeFailure::Disconnected),
            first = tokio::time::timeout(self.config.handshake_timeout, next_text(stream)) => first,
        };
        let text = first.map_err(|_| HandshakeFailure::Protocol(ProtocolError::HandshakeTimeout))??;

        let message = Message::decode(&text).map_err(HandshakeFailure::Protocol)?;
        let kind = message.kind();
        let MessageBody::Authorization(token) = message.body else {
            return Err(HandshakeFailure::Protocol(
                ProtocolError::UnexpectedFirstMessage(kind.to_string()),
            ));
        };

        self.tokens.validate(&token).map_err(HandshakeFailure::Auth)
    }

    /// Admit an authenticated session. `None` once the registry is closed.
    async fn activate<Si>(&self, identity: String, sink: Si) -> Option<Arc<ConnectionHandle>>
    where
        Si: Sink<Outbound> + Send + Unpin + 'static,
        Si::Error: fmt::Display,
    {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer);
        let connection = Arc::new(ConnectionHandle::new(identity, tx));
        spawn_writer(sink, rx, connection.release_token(), connection.id);
        if !self.registry.admit(connection.clone()).await {
            info!(conn_id = %connection.id, "Session refused, shutting down");
            return None;
        }

        if let Some(period) = self.config.notification_period {
            let cancel = CancellationToken::new();
            if self.registry.bind_task(connection.id, cancel.clone()).await {
                spawn_notifier(connection.clone(), self.dispatcher.clone(), period, cancel);
            }
        }
        Some(connection)
    }

    async fn run_active<St>(&self, connection: &Arc<ConnectionHandle>, stream: &mut St)
    where
        St: Stream<Item = Inbound> + Unpin,
    {
        loop {
            let frame = tokio::select! {
                _ = connection.released() => {
                    debug!(conn_id = %connection.id, "Connection released by registry");
                    return;
                }
                frame = stream.next() => frame,
            };

            match frame {
                Some(Inbound::Text(text)) => {
                    if self.dispatch_text(connection, &text).await.is_break() {
                        return;
                    }
                }
                Some(Inbound::Control) => {}
                Some(Inbound::Binary) => {
                    info!(conn_id = %connection.id, "Binary frame received, closing");
                    return;
                }
                Some(Inbound::Error(e)) => {
                    warn!(conn_id = %connection.id, error = %e, "WebSocket read failed");
                    return;
                }
                Some(Inbound::Close) | None => return,
            }
        }
    }

    async fn dispatch_text(&self, connection: &ConnectionHandle, text: &str) -> ControlFlow<()> {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(conn_id = %connection.id, error = %e, "Undecodable message, closing");
                notify(connection, INVALID_FORMAT);
                return ControlFlow::Break(());
            }
        };

        match message.kind() {
            MessageKind::Logout => {
                self.registry.retire_by_identity(&connection.identity).await;
                ControlFlow::Break(())
            }
            MessageKind::Authorization => {
                notify(connection, INVALID_TYPE);
                ControlFlow::Continue(())
            }
            _ => {
                let message = message.stamped_by(&connection.identity);
                self.dispatcher
                    .broadcast(&Audience::Identity(connection.identity.clone()), &message)
                    .await;
                ControlFlow::Continue(())
            }
        }
    }
}

/// Next text frame, skipping control frames.
async fn next_text<St>(stream: &mut St) -> Result<String, HandshakeFailure>
where
    St: Stream<Item = Inbound> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Inbound::Text(text)) => return Ok(text),
            Some(Inbound::Control) => continue,
            Some(Inbound::Binary) => {
                return Err(HandshakeFailure::Protocol(ProtocolError::MalformedMessage(
                    "binary frame".into(),
                )));
            }
            Some(Inbound::Close) | Some(Inbound::Error(_)) | None => {
                return Err(HandshakeFailure::Disconnected);
            }
        }
    }
}

/// Queue a best-effort error notice.
fn notify(connection: &ConnectionHandle, text: &str) {
    if let Err(e) = connection.send_message(&Message::error(text)) {
        warn!(conn_id = %connection.id, error = %e, "Failed to send error notice");
    }
}

/// Send a handshake rejection straight to the transport.
async fn reject<Si>(sink: &mut Si, failure: &HandshakeFailure)
where
    Si: Sink<Outbound> + Unpin,
    Si::Error: fmt::Display,
{
    let Some(notice) = failure.notice() else {
        debug!(reason = %failure, "Handshake abandoned");
        return;
    };
    info!(reason = %failure, "Handshake rejected");

    if let Err(e) = sink.send(Outbound::Text(Message::error(notice).encode())).await {
        warn!(error = %e, "Failed to send handshake error notice");
        return;
    }
    if let Err(e) = sink.send(Outbound::close(CLOSE_POLICY, notice)).await {
        debug!(error = %e, "Failed to send handshake close frame");
    }
}

/// Drain the outbound queue into the transport.
///
/// Queued frames are flushed before a release takes effect. A write error
/// releases the connection so the session loop tears it down.
fn spawn_writer<Si>(
    mut sink: Si,
    mut rx: mpsc::Receiver<Outbound>,
    released: CancellationToken,
    conn_id: ConnectionId,
) -> JoinHandle<()>
where
    Si: Sink<Outbound> + Send + Unpin + 'static,
    Si::Error: fmt::Display,
{
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                biased;
                frame = rx.recv() => frame,
                _ = released.cancelled() => None,
            };
            let Some(frame) = frame else { break };

            let closing = matches!(frame, Outbound::Close { .. });
            if let Err(e) = sink.send(frame).await {
                warn!(conn_id = %conn_id, error = %e, "WebSocket write failed");
                released.cancel();
                break;
            }
            if closing {
                break;
            }
        }
        if let Err(e) = sink.close().await {
            debug!(conn_id = %conn_id, error = %e, "WebSocket close failed");
        }
    })
}
