//! # Document Store
//!
//! The seam between the memory layer and the backing document database.
//!
//! Implementations (e.g. `memory-cosmos`) only move JSON documents and execute
//! parameterized queries; query text and document shaping live in the `memory` crate.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// One named query parameter (`@name`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// Sort key of a query's `ORDER BY`, as it appears in each result row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Top-level property of the projected row (e.g. `timestamp`, `similarity_score`).
    pub field: String,
    pub descending: bool,
}

/// A parameterized query. Values are always passed as parameters, never inlined into `query`.
///
/// `order_by` and `top` are not sent; they describe the query's `ORDER BY` and `TOP` so a
/// store that runs it per partition can merge the partial results.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuerySpec {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
    #[serde(skip)]
    pub order_by: Option<OrderBy>,
    #[serde(skip)]
    pub top: Option<usize>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
            order_by: None,
            top: None,
        }
    }

    /// Declares the sort key; `field` must be projected by the query.
    pub fn ordered_by(mut self, field: &str, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending,
        });
        self
    }

    /// Declares the query's `TOP` limit.
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Whether the query sorts or limits, so partial results from several partitions
    /// must be merged.
    pub fn needs_merge(&self) -> bool {
        self.order_by.is_some() || self.top.is_some()
    }

    /// Adds a parameter. `name` must include the leading `@`.
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Looks up a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Trait for writing, querying and deleting JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document in the given partition and returns the stored body.
    async fn create(&self, document: Value, partition_key: &str) -> Result<Value>;

    /// Runs a query. `partition_key = None` runs it across all partitions; results then
    /// honour the query's declared `order_by` and `top`.
    async fn query(&self, query: &QuerySpec, partition_key: Option<&str>) -> Result<Vec<Value>>;

    /// Deletes a document. Returns `MemoryError::NotFound` if it does not exist.
    async fn delete(&self, id: &str, partition_key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_hints_are_not_serialized() {
        let query = QuerySpec::new("SELECT TOP @k c.messages, c.timestamp FROM c ORDER BY c.timestamp DESC")
            .with_param("@k", 3)
            .ordered_by("timestamp", true)
            .with_top(3);
        assert!(query.needs_merge());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "query": "SELECT TOP @k c.messages, c.timestamp FROM c ORDER BY c.timestamp DESC",
                "parameters": [{"name": "@k", "value": 3}]
            })
        );
        assert!(!QuerySpec::new("SELECT * FROM c").needs_merge());
    }
}
