//! The document model shared by every store backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field set of a document, without the store-managed keys.
pub type DocumentBody = Map<String, Value>;

/// Keys owned by the store. Callers cannot set them through a body.
pub const RESERVED_KEYS: [&str; 3] = ["_id", "version", "modified_at"];

/// Opaque, immutable document identifier (UUID v7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A stored document: identifier, version, timestamp and the caller's fields.
///
/// Serializes as one flat JSON object with `_id`, `version` and
/// `modified_at` next to the body fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Immutable identifier.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Starts at 1, incremented by exactly 1 on every successful replace.
    pub version: i64,
    /// Time of the last insert or replace.
    pub modified_at: DateTime<Utc>,
    /// Caller-owned fields.
    #[serde(flatten)]
    pub body: DocumentBody,
}

impl Document {
    /// Build a fresh version-1 document from a caller body.
    pub fn new(body: DocumentBody) -> Self {
        Self {
            id: DocumentId::new(),
            version: 1,
            modified_at: Utc::now(),
            body: strip_reserved(body),
        }
    }

    /// Look up a body field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    /// Look up a string body field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }

    /// Resolve a filterable field, including the store-managed ones.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "_id" => Some(Value::String(self.id.to_string())),
            "version" => Some(Value::from(self.version)),
            other => self.body.get(other).cloned(),
        }
    }

    /// Swap in a new body, bumping the version and timestamp.
    ///
    /// Returns `false` without touching anything when the body is unchanged.
    pub fn replace_body(&mut self, body: DocumentBody) -> bool {
        let body = strip_reserved(body);
        if body == self.body {
            return false;
        }
        self.body = body;
        self.version += 1;
        self.modified_at = Utc::now();
        true
    }
}

/// Drop store-managed keys from a caller-supplied body.
pub fn strip_reserved(mut body: DocumentBody) -> DocumentBody {
    for key in RESERVED_KEYS {
        body.remove(key);
    }
    body
}
