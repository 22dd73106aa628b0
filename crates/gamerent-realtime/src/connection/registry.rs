//! Registry of live connections keyed by identity.
//!
//! All three maps sit behind one `RwLock`, so admission, retirement and
//! snapshots always observe them consistent with each other. Nothing is
//! awaited while the lock is held except the lock itself; transport
//! release and task cancellation happen after the guard is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frame::{CLOSE_GOING_AWAY, CLOSE_NORMAL, Outbound};
use super::handle::{ConnectionHandle, ConnectionId};

/// Close reason sent to every connection of an identity on logout.
pub const LOGOUT_REASON: &str = "User logged out";

/// Close reason sent to every connection on process shutdown.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, Arc<ConnectionHandle>>,
    by_identity: HashMap<String, HashSet<ConnectionId>>,
    tasks: HashMap<ConnectionId, CancellationToken>,
    closed: bool,
}

impl RegistryState {
    /// Remove every entry for `id`, returning the handle and its task token.
    fn take(
        &mut self,
        id: &ConnectionId,
    ) -> Option<(Arc<ConnectionHandle>, Option<CancellationToken>)> {
        let handle = self.connections.remove(id)?;
        if let Some(ids) = self.by_identity.get_mut(&handle.identity) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_identity.remove(&handle.identity);
            }
        }
        let task = self.tasks.remove(id);
        Some((handle, task))
    }
}

/// Owns the identity-to-connection mapping and each connection's
/// background-task cancellation token.
#[derive(Debug)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
    logout_grace: Duration,
}

impl ConnectionRegistry {
    /// Create an empty registry. `logout_grace` is how long a logged-out
    /// connection keeps its transport after the close notice.
    pub fn new(logout_grace: Duration) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            logout_grace,
        }
    }

    /// Register an authenticated connection. One identity may hold many.
    ///
    /// After [`close_all`](Self::close_all) the registry stays closed: the
    /// handle gets the shutdown close frame, is released, and `false` is
    /// returned.
    pub async fn admit(&self, handle: Arc<ConnectionHandle>) -> bool {
        let mut state = self.state.write().await;
        if state.closed {
            drop(state);
            if let Err(e) = handle.send(Outbound::close(CLOSE_GOING_AWAY, SHUTDOWN_REASON)) {
                warn!(conn_id = %handle.id, error = %e, "Failed to send shutdown close frame");
            }
            handle.release();
            debug!(
                conn_id = %handle.id,
                identity = %handle.identity,
                "Admission refused after shutdown"
            );
            return false;
        }
        state
            .by_identity
            .entry(handle.identity.clone())
            .or_default()
            .insert(handle.id);
        info!(conn_id = %handle.id, identity = %handle.identity, "Connection admitted");
        state.connections.insert(handle.id, handle);
        true
    }

    /// Attach a cancellable background task to a connection.
    ///
    /// If the connection is not registered (already retired, or never
    /// admitted) the token is cancelled immediately and `false` is returned.
    /// A previously bound token is cancelled and replaced.
    pub async fn bind_task(&self, id: ConnectionId, token: CancellationToken) -> bool {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(&id) {
            drop(state);
            token.cancel();
            return false;
        }
        if let Some(previous) = state.tasks.insert(id, token) {
            previous.cancel();
        }
        true
    }

    /// Remove a connection, cancel its task and release its transport.
    ///
    /// Idempotent: returns whether anything was removed.
    pub async fn retire(&self, id: ConnectionId) -> bool {
        let taken = self.state.write().await.take(&id);
        let Some((handle, task)) = taken else {
            return false;
        };
        if let Some(task) = task {
            task.cancel();
        }
        handle.release();
        debug!(conn_id = %id, identity = %handle.identity, "Connection retired");
        true
    }

    /// Retire every connection of `identity` after sending each a close
    /// notice and waiting the logout grace period.
    ///
    /// Returns the number of connections retired.
    pub async fn retire_by_identity(&self, identity: &str) -> usize {
        let retired: Vec<_> = {
            let mut state = self.state.write().await;
            let ids: Vec<ConnectionId> = state
                .by_identity
                .get(identity)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default();
            ids.iter().filter_map(|id| state.take(id)).collect()
        };
        if retired.is_empty() {
            return 0;
        }

        for (handle, task) in &retired {
            if let Err(e) = handle.send(Outbound::close(CLOSE_NORMAL, LOGOUT_REASON)) {
                warn!(conn_id = %handle.id, identity, error = %e, "Failed to send logout close frame");
            }
            if let Some(task) = task {
                task.cancel();
            }
        }

        tokio::time::sleep(self.logout_grace).await;

        for (handle, _) in &retired {
            handle.release();
        }
        info!(identity, count = retired.len(), "Identity logged out of all connections");
        retired.len()
    }

    /// Retire everything and refuse later admissions. Used on process
    /// shutdown.
    pub async fn close_all(&self) -> usize {
        let state = {
            let mut guard = self.state.write().await;
            guard.closed = true;
            RegistryState {
                connections: std::mem::take(&mut guard.connections),
                by_identity: std::mem::take(&mut guard.by_identity),
                tasks: std::mem::take(&mut guard.tasks),
                closed: true,
            }
        };
        let count = state.connections.len();

        for token in state.tasks.values() {
            token.cancel();
        }
        for handle in state.connections.values() {
            // The writer flushes queued frames before it stops.
            if let Err(e) = handle.send(Outbound::close(CLOSE_GOING_AWAY, SHUTDOWN_REASON)) {
                warn!(
                    conn_id = %handle.id,
                    identity = %handle.identity,
                    error = %e,
                    "Failed to send shutdown close frame"
                );
            }
            handle.release();
        }
        if count > 0 {
            info!(count, "Closed all real-time connections");
        }
        count
    }

    /// Snapshot of connections matching `predicate`, taken under the lock.
    pub async fn snapshot<F>(&self, predicate: F) -> Vec<Arc<ConnectionHandle>>
    where
        F: Fn(&ConnectionHandle) -> bool,
    {
        self.state
            .read()
            .await
            .connections
            .values()
            .filter(|handle| predicate(handle.as_ref()))
            .cloned()
            .collect()
    }

    /// Look up a connection.
    pub async fn get(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.state.read().await.connections.get(id).cloned()
    }

    /// Ids of every connection of `identity`.
    pub async fn connections_of(&self, identity: &str) -> Vec<ConnectionId> {
        self.state
            .read()
            .await
            .by_identity
            .get(identity)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Number of distinct connected identities.
    pub async fn identity_count(&self) -> usize {
        self.state.read().await.by_identity.len()
    }
}
