//! Periodic per-connection server notifications.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::ConnectionHandle;
use crate::dispatch::BroadcastDispatcher;
use crate::message::Message;

/// Text of the `n`th notification for `identity`.
pub fn notification_text(identity: &str, n: u64) -> String {
    format!("Hello {identity}, this is a sample notification no. {n}")
}

/// Spawn the notifier for one connection.
///
/// The task stops at the first tick after `cancel` fires, or when a write
/// fails (the dispatcher retires the connection in that case).
pub fn spawn_notifier(
    handle: Arc<ConnectionHandle>,
    dispatcher: BroadcastDispatcher,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut sent: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    sent += 1;
                    let message = Message::notification(notification_text(&handle.identity, sent));
                    if dispatcher.send_to(handle.id, &message).await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(conn_id = %handle.id, identity = %handle.identity, sent, "Notifier stopped");
    })
}
