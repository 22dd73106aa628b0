//! Catalog listing query parameters.

use serde::{Deserialize, Serialize};

use gamerent_core::types::Pagination;

/// Query parameters for `GET /api/items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Case-insensitive `LIKE` pattern matched against the title.
    pub title: Option<String>,
    /// Number of matches to skip.
    pub skip: Option<u64>,
    /// Maximum number of items to return (capped at 100).
    pub limit: Option<u64>,
}

impl ItemQuery {
    /// Non-empty title pattern, if any.
    pub fn title_pattern(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Converts to a `Pagination`, or `None` when neither bound was given.
    pub fn pagination(&self) -> Option<Pagination> {
        if self.skip.is_none() && self.limit.is_none() {
            return None;
        }
        Some(Pagination::new(self.skip.unwrap_or(0), self.limit))
    }
}
