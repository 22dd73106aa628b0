//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound queue capacity per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Seconds a new connection has to send its authorization message.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
    /// Milliseconds between a logout close notice and releasing the socket.
    #[serde(default = "default_logout_grace")]
    pub logout_grace_ms: u64,
    /// Periodic server notification settings.
    #[serde(default)]
    pub notifications: NotificationRealtimeConfig,
}

/// Periodic per-connection notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRealtimeConfig {
    /// Whether authenticated connections receive periodic notifications.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval between notifications in seconds.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            handshake_timeout_seconds: default_handshake_timeout(),
            logout_grace_ms: default_logout_grace(),
            notifications: NotificationRealtimeConfig::default(),
        }
    }
}

impl Default for NotificationRealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_interval(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_logout_grace() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    20
}
