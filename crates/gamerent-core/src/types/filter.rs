//! Filter types for document queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact JSON equality.
    Eq,
    /// SQL `LIKE` pattern match (`%` any run, `_` one character).
    Like,
    /// Case-insensitive `LIKE`.
    ILike,
}

/// A single condition on a named field. `_id` addresses the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value or pattern to compare against.
    pub value: Value,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Conjunction of field conditions. Empty matches every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Conditions, all of which must hold.
    pub fields: Vec<FilterField>,
}

impl Filter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on the document identifier.
    pub fn by_id(id: impl ToString) -> Self {
        Self::all().eq("_id", id.to_string())
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FilterField::new(field, FilterOp::Eq, value));
        self
    }

    /// Add a `LIKE` condition.
    pub fn like(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.fields
            .push(FilterField::new(field, FilterOp::Like, pattern.into()));
        self
    }

    /// Add a case-insensitive `LIKE` condition.
    pub fn ilike(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.fields
            .push(FilterField::new(field, FilterOp::ILike, pattern.into()));
        self
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
