//! Typed real-time messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use gamerent_core::error::ProtocolError;

use super::envelope::Envelope;

/// `sender` on messages originated by the server.
pub const SERVER_SENDER: &str = "server";

/// The closed set of message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Client handshake carrying a token.
    Authorization,
    /// Server notification text.
    Notification,
    /// Client request to end every session of its identity.
    Logout,
    /// Protocol error notice.
    Error,
    /// Free-form text between a user's devices.
    Chat,
    /// A catalog item was created.
    ItemCreated,
    /// A catalog item was updated.
    ItemUpdated,
    /// A catalog item was deleted.
    ItemDeleted,
}

impl MessageKind {
    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Notification => "notification",
            Self::Logout => "logout",
            Self::Error => "error",
            Self::Chat => "chat",
            Self::ItemCreated => "item_created",
            Self::ItemUpdated => "item_updated",
            Self::ItemDeleted => "item_deleted",
        }
    }

    /// Parse a wire tag.
    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "authorization" => Self::Authorization,
            "notification" => Self::Notification,
            "logout" => Self::Logout,
            "error" => Self::Error,
            "chat" => Self::Chat,
            "item_created" => Self::ItemCreated,
            "item_updated" => Self::ItemUpdated,
            "item_deleted" => Self::ItemDeleted,
            _ => return None,
        })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Bearer token presented during the handshake.
    Authorization(String),
    /// Notification text.
    Notification(String),
    /// Logout request.
    Logout,
    /// Error notice text.
    Error(String),
    /// Chat text.
    Chat(String),
    /// Created item.
    ItemCreated(Map<String, Value>),
    /// Updated item.
    ItemUpdated(Map<String, Value>),
    /// Id of the deleted item.
    ItemDeleted(String),
}

impl MessageBody {
    /// The kind tag of this body.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Authorization(_) => MessageKind::Authorization,
            Self::Notification(_) => MessageKind::Notification,
            Self::Logout => MessageKind::Logout,
            Self::Error(_) => MessageKind::Error,
            Self::Chat(_) => MessageKind::Chat,
            Self::ItemCreated(_) => MessageKind::ItemCreated,
            Self::ItemUpdated(_) => MessageKind::ItemUpdated,
            Self::ItemDeleted(_) => MessageKind::ItemDeleted,
        }
    }

    fn payload(&self) -> Option<Value> {
        match self {
            Self::Logout => None,
            Self::Authorization(text)
            | Self::Notification(text)
            | Self::Error(text)
            | Self::Chat(text)
            | Self::ItemDeleted(text) => Some(Value::String(text.clone())),
            Self::ItemCreated(item) | Self::ItemUpdated(item) => Some(Value::Object(item.clone())),
        }
    }

    fn from_parts(kind: MessageKind, payload: Option<Value>) -> Result<Self, ProtocolError> {
        let text = |payload: Option<Value>| match payload {
            Some(Value::String(text)) => Ok(text),
            _ => Err(ProtocolError::MalformedMessage(format!(
                "'{kind}' payload must be a string"
            ))),
        };
        let object = |payload: Option<Value>| match payload {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(ProtocolError::MalformedMessage(format!(
                "'{kind}' payload must be an object"
            ))),
        };

        Ok(match kind {
            MessageKind::Authorization => Self::Authorization(text(payload)?),
            MessageKind::Notification => Self::Notification(text(payload)?),
            MessageKind::Logout => Self::Logout,
            MessageKind::Error => Self::Error(text(payload)?),
            MessageKind::Chat => Self::Chat(text(payload)?),
            MessageKind::ItemCreated => Self::ItemCreated(object(payload)?),
            MessageKind::ItemUpdated => Self::ItemUpdated(object(payload)?),
            MessageKind::ItemDeleted => Self::ItemDeleted(text(payload)?),
        })
    }
}

/// A decoded message with its routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Content.
    pub body: MessageBody,
    /// Originating identity. Always set by the server on outbound messages.
    pub sender: Option<String>,
    /// Server stamp.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// A server-originated message stamped now.
    pub fn from_server(body: MessageBody) -> Self {
        Self {
            body,
            sender: Some(SERVER_SENDER.to_string()),
            timestamp: Some(Utc::now()),
        }
    }

    /// An error notice from the server.
    pub fn error(text: impl Into<String>) -> Self {
        Self::from_server(MessageBody::Error(text.into()))
    }

    /// A notification from the server.
    pub fn notification(text: impl Into<String>) -> Self {
        Self::from_server(MessageBody::Notification(text.into()))
    }

    /// The kind tag.
    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// Re-stamp an inbound message with the authenticated sender.
    ///
    /// Whatever `sender` the client supplied is discarded.
    pub fn stamped_by(mut self, identity: &str) -> Self {
        self.sender = Some(identity.to_string());
        self.timestamp = Some(Utc::now());
        self
    }

    /// Decode a text frame.
    ///
    /// Unknown kinds and payloads of the wrong shape are malformed.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedMessage(e.to_string()))?;
        let kind = MessageKind::parse(&envelope.kind).ok_or_else(|| {
            ProtocolError::MalformedMessage(format!("unknown message type '{}'", envelope.kind))
        })?;

        Ok(Self {
            body: MessageBody::from_parts(kind, envelope.payload)?,
            sender: envelope.sender,
            timestamp: envelope.timestamp,
        })
    }

    /// The wire envelope.
    pub fn to_envelope(&self) -> Envelope {
        Envelope {
            kind: self.kind().as_str().to_string(),
            payload: self.body.payload(),
            sender: self.sender.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> String {
        self.to_envelope().to_value().to_string()
    }
}
