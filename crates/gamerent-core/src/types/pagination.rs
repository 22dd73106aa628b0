//! Skip/limit pagination for document queries.

use serde::{Deserialize, Serialize};

/// Maximum page size accepted from callers.
pub const MAX_LIMIT: u64 = 100;

/// Skip/limit window applied after filtering, in insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of matching documents to skip.
    #[serde(default)]
    pub skip: u64,
    /// Maximum number of documents to return; `None` means no limit.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl Pagination {
    /// Create a window; the limit is clamped to [`MAX_LIMIT`].
    pub fn new(skip: u64, limit: Option<u64>) -> Self {
        Self {
            skip,
            limit: limit.map(|l| l.min(MAX_LIMIT)),
        }
    }

    /// Apply the window to an iterator.
    pub fn apply<I: Iterator>(&self, iter: I) -> impl Iterator<Item = I::Item> {
        let skipped = iter.skip(usize::try_from(self.skip).unwrap_or(usize::MAX));
        let limit = self
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        skipped.take(limit)
    }
}
