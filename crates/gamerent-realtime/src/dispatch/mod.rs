//! Fan-out of messages to registered connections.

pub mod broadcaster;

pub use broadcaster::{Audience, BroadcastDispatcher, BroadcastReport};
