//! Real-time message types and their JSON wire form.

pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::{Message, MessageBody, MessageKind, SERVER_SENDER};
