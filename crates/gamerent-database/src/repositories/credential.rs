//! Credential repository over the `users` collection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use gamerent_core::result::StoreResult;
use gamerent_core::traits::DocumentStore;
use gamerent_core::types::{Document, DocumentId, Filter};

/// Collection holding one document per account.
pub const USERS_COLLECTION: &str = "users";

/// A stored login credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// Document identifier, exposed to clients as the user id.
    pub id: DocumentId,
    /// Unique identity string.
    pub username: String,
    /// Base64 password hash.
    pub password_hash: String,
    /// Base64 salt the hash was derived with.
    pub salt: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Document version.
    pub version: i64,
}

impl Credential {
    fn from_document(doc: Document) -> Option<Self> {
        let created_at = doc
            .get_str("date")
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map_or(doc.modified_at, |d| d.with_timezone(&Utc));
        Some(Self {
            id: doc.id,
            username: doc.get_str("username")?.to_string(),
            password_hash: doc.get_str("password")?.to_string(),
            salt: doc.get_str("salt")?.to_string(),
            created_at,
            version: doc.version,
        })
    }
}

/// Repository for account credentials.
#[derive(Clone)]
pub struct CredentialRepository {
    store: Arc<dyn DocumentStore>,
}

impl CredentialRepository {
    /// Create a new credential repository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a new credential; `Conflict` if the username is taken.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        salt: &str,
    ) -> StoreResult<DocumentId> {
        let mut body = Map::new();
        body.insert("username".into(), Value::from(username));
        body.insert("password".into(), Value::from(password_hash));
        body.insert("salt".into(), Value::from(salt));
        body.insert("date".into(), Value::from(Utc::now().to_rfc3339()));

        let unique = Filter::all().eq("username", username);
        self.store
            .insert(USERS_COLLECTION, Some(&unique), body)
            .await
    }

    /// Find a credential by its exact username.
    pub async fn find_by_username(&self, username: &str) -> StoreResult<Option<Credential>> {
        let doc = self
            .store
            .find_one(USERS_COLLECTION, &Filter::all().eq("username", username))
            .await?;
        Ok(doc.and_then(Credential::from_document))
    }
}
