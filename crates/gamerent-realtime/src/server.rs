//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use gamerent_auth::SessionTokenManager;
use gamerent_core::config::realtime::RealtimeConfig;

use crate::connection::ConnectionRegistry;
use crate::dispatch::{Audience, BroadcastDispatcher, BroadcastReport};
use crate::gateway::{GatewayConfig, RealtimeGateway};
use crate::message::Message;

/// Central real-time engine: one registry, its dispatcher, and the gateway
/// that admits connections into it.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Broadcast fan-out over the registry.
    pub dispatcher: BroadcastDispatcher,
    /// Per-connection session driver.
    pub gateway: Arc<RealtimeGateway>,
    shutdown: CancellationToken,
}

impl RealtimeEngine {
    /// Creates the engine and all its subsystems.
    pub fn new(config: &RealtimeConfig, tokens: Arc<SessionTokenManager>) -> Self {
        let shutdown = CancellationToken::new();
        let registry = Arc::new(ConnectionRegistry::new(Duration::from_millis(
            config.logout_grace_ms,
        )));
        let dispatcher = BroadcastDispatcher::new(registry.clone());
        let gateway = Arc::new(RealtimeGateway::new(
            registry.clone(),
            dispatcher.clone(),
            tokens,
            GatewayConfig::from(config),
            shutdown.clone(),
        ));

        info!(
            notifications = config.notifications.enabled,
            handshake_timeout_seconds = config.handshake_timeout_seconds,
            "Real-time engine initialized"
        );

        Self {
            registry,
            dispatcher,
            gateway,
            shutdown,
        }
    }

    /// Send a server message to every connection of `identity`.
    pub async fn notify_identity(&self, identity: &str, message: &Message) -> BroadcastReport {
        self.dispatcher
            .broadcast(&Audience::Identity(identity.to_string()), message)
            .await
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops pending handshakes and closes every connection.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.shutdown.cancel();
        let closed = self.registry.close_all().await;
        info!(closed, "Real-time engine shut down");
    }
}
