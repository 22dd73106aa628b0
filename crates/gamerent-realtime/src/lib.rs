//! # gamerent-realtime
//!
//! Real-time WebSocket engine for GameRent:
//!
//! - typed messages decoded from a JSON envelope at the boundary
//! - a connection registry keyed by identity, guarding every map with one lock
//! - broadcast fan-out with eviction of connections that cannot keep up
//! - the per-connection session gateway (handshake, dispatch loop, teardown)
//! - periodic per-connection server notifications
//!
//! The gateway is transport-agnostic: it drives any
//! `Stream<Item = Inbound>` / `Sink<Outbound>` pair, so the HTTP layer only
//! adapts its WebSocket frames.

pub mod connection;
pub mod dispatch;
pub mod gateway;
pub mod message;
pub mod notifier;
pub mod server;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionRegistry, Inbound, Outbound};
pub use dispatch::{Audience, BroadcastDispatcher, BroadcastReport};
pub use gateway::{GatewayConfig, RealtimeGateway, SessionState};
pub use message::{Message, MessageBody, MessageKind};
pub use server::RealtimeEngine;
