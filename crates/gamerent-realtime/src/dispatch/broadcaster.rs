//! Broadcast dispatcher with failure eviction.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use gamerent_core::error::TransportError;

use crate::connection::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbound};
use crate::message::Message;

/// Predicate over connections selecting broadcast targets.
#[derive(Clone)]
pub enum Audience {
    /// Every registered connection.
    All,
    /// Every connection of one identity.
    Identity(String),
    /// Arbitrary selection rule.
    Matching(Arc<dyn Fn(&ConnectionHandle) -> bool + Send + Sync>),
}

impl Audience {
    /// Build an audience from a closure.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&ConnectionHandle) -> bool + Send + Sync + 'static,
    {
        Self::Matching(Arc::new(predicate))
    }

    /// Whether `handle` is part of this audience.
    pub fn includes(&self, handle: &ConnectionHandle) -> bool {
        match self {
            Self::All => true,
            Self::Identity(identity) => handle.identity == *identity,
            Self::Matching(predicate) => predicate(handle),
        }
    }
}

impl fmt::Debug for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Identity(identity) => f.debug_tuple("Identity").field(identity).finish(),
            Self::Matching(_) => f.write_str("Matching(..)"),
        }
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the message was queued for.
    pub delivered: usize,
    /// Connections whose write failed and that were retired.
    pub evicted: Vec<ConnectionId>,
}

/// Sends messages to subsets of the registry.
///
/// Targets are snapshotted under the registry lock, then written with
/// non-blocking enqueues outside it. A failed write retires that
/// connection and the broadcast carries on with the rest.
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastDispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send `message` to every connection in `audience`.
    pub async fn broadcast(&self, audience: &Audience, message: &Message) -> BroadcastReport {
        let targets = self.registry.snapshot(|handle| audience.includes(handle)).await;
        let text = message.encode();
        let mut report = BroadcastReport::default();

        for handle in targets {
            match handle.send(Outbound::Text(text.clone())) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        conn_id = %handle.id,
                        identity = %handle.identity,
                        error = %e,
                        "Broadcast write failed, evicting connection"
                    );
                    self.registry.retire(handle.id).await;
                    report.evicted.push(handle.id);
                }
            }
        }

        debug!(
            kind = %message.kind(),
            ?audience,
            delivered = report.delivered,
            evicted = report.evicted.len(),
            "Broadcast complete"
        );
        report
    }

    /// Send `message` to one connection, retiring it if the write fails.
    pub async fn send_to(&self, id: ConnectionId, message: &Message) -> Result<(), TransportError> {
        let handle = self
            .registry
            .get(&id)
            .await
            .ok_or(TransportError::Disconnected)?;
        if let Err(e) = handle.send_message(message) {
            warn!(conn_id = %id, error = %e, "Direct write failed, evicting connection");
            self.registry.retire(id).await;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::MessageBody;
    use tokio::sync::mpsc;

    fn chat(text: &str) -> Message {
        Message::from_server(MessageBody::Chat(text.into()))
    }

    #[tokio::test]
    async fn test_broadcast_evicts_exactly_the_failing_connections() {
        let registry = Arc::new(ConnectionRegistry::new(Duration::ZERO));
        let dispatcher = BroadcastDispatcher::new(registry.clone());

        let mut healthy = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(8);
            let handle = Arc::new(ConnectionHandle::new("alice", tx));
            registry.admit(handle).await;
            healthy.push(rx);
        }
        let mut failing = Vec::new();
        for _ in 0..2 {
            let (tx, rx) = mpsc::channel(8);
            let handle = Arc::new(ConnectionHandle::new("alice", tx));
            failing.push(handle.id);
            registry.admit(handle).await;
            drop(rx);
        }

        let report = dispatcher.broadcast(&Audience::All, &chat("hi")).await;
        assert_eq!(report.delivered + report.evicted.len(), 5);
        assert_eq!(report.delivered, 3);

        let mut evicted = report.evicted.clone();
        evicted.sort();
        failing.sort();
        assert_eq!(evicted, failing);
        assert_eq!(registry.connection_count().await, 3);

        for rx in &mut healthy {
            assert!(matches!(rx.try_recv(), Ok(Outbound::Text(_))));
        }
    }

    #[tokio::test]
    async fn test_identity_audience_and_retired_connections() {
        let registry = Arc::new(ConnectionRegistry::new(Duration::ZERO));
        let dispatcher = BroadcastDispatcher::new(registry.clone());

        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let alice = Arc::new(ConnectionHandle::new("alice", tx_a));
        let bob = Arc::new(ConnectionHandle::new("bob", tx_b));
        registry.admit(alice.clone()).await;
        registry.admit(bob.clone()).await;

        let report = dispatcher
            .broadcast(&Audience::Identity("alice".into()), &chat("psst"))
            .await;
        assert_eq!(report.delivered, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());

        registry.retire(alice.id).await;
        let report = dispatcher.broadcast(&Audience::All, &chat("again")).await;
        assert_eq!(report.delivered, 1);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_is_evicted() {
        let registry = Arc::new(ConnectionRegistry::new(Duration::ZERO));
        let dispatcher = BroadcastDispatcher::new(registry.clone());

        let (tx, _rx) = mpsc::channel(1);
        let slow = Arc::new(ConnectionHandle::new("alice", tx));
        registry.admit(slow.clone()).await;

        let audience = Audience::matching(|h| h.identity.starts_with("al"));
        assert_eq!(dispatcher.broadcast(&audience, &chat("1")).await.delivered, 1);
        let report = dispatcher.broadcast(&audience, &chat("2")).await;
        assert_eq!(report.evicted, vec![slow.id]);
        assert!(slow.is_released());

        assert_eq!(
            dispatcher.send_to(slow.id, &chat("3")).await,
            Err(TransportError::Disconnected)
        );
    }
}
