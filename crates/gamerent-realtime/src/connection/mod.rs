//! Connection handles, transport frames and the connection registry.

pub mod frame;
pub mod handle;
pub mod registry;

pub use frame::{Inbound, Outbound};
pub use handle::{ConnectionHandle, ConnectionId};
pub use registry::ConnectionRegistry;
