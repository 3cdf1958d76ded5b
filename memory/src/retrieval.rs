//! Retrieval adapter: parameterized queries and reshaping of query rows.
//!
//! Every query passes its values as `@name` parameters. A `thread_id` filter pins the
//! query to that partition; everything else runs cross-partition.

use memory_core::{
    DocumentStore, Message, MemoryError, QuerySpec, Result, RetrievedTurn, StoredDocument,
    SummaryDetails, ThreadSummary, Turn, TurnMetadata,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Optional owner/thread equality filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFilter {
    pub user_id: Option<String>,
    pub thread_id: Option<String>,
}

impl MemoryFilter {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            thread_id: None,
        }
    }

    pub fn thread(thread_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            thread_id: Some(thread_id.into()),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.thread_id.is_none()
    }

    /// Partition to pin the query to, if any.
    pub fn partition(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    fn apply(&self, mut conditions: Vec<&'static str>, mut query: QuerySpec) -> (Vec<&'static str>, QuerySpec) {
        if let Some(user_id) = &self.user_id {
            conditions.push("c.user_id = @user_id");
            query = query.with_param("@user_id", user_id.as_str());
        }
        if let Some(thread_id) = &self.thread_id {
            conditions.push("c.thread_id = @thread_id");
            query = query.with_param("@thread_id", thread_id.as_str());
        }
        (conditions, query)
    }
}

/// Output shape of a vector search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Keep token counts and append id, owner, thread and timestamp.
    pub detailed: bool,
    /// Append the vector distance as `similarity_score`.
    pub with_score: bool,
}

/// One query row: a projection of a memory document.
#[derive(Debug, Default, Deserialize)]
struct TurnRow {
    #[serde(default)]
    messages: Vec<Message>,
    id: Option<String>,
    user_id: Option<String>,
    thread_id: Option<String>,
    timestamp: Option<String>,
    similarity_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SummaryRow {
    summary: String,
    #[serde(default)]
    facts: Vec<String>,
    thread_id: Option<String>,
    user_id: Option<String>,
    token_count: Option<u32>,
    last_updated: Option<String>,
}

/// Row property holding the vector distance. Always projected so partial results from
/// several partitions can be merged; only reported when a score was requested.
const SCORE_FIELD: &str = "similarity_score";
/// Always projected for the same reason; only reported with `detailed`.
const TIMESTAMP_FIELD: &str = "timestamp";

fn search_query(embedding: &[f32], k: usize, filter: &MemoryFilter, options: SearchOptions) -> QuerySpec {
    let mut select = Vec::new();
    if options.detailed {
        select.push("c.id, c.user_id, c.thread_id, c.timestamp");
    }
    select.push("c.messages");
    select.push("VectorDistance(c.embedding, @embedding) AS similarity_score");
    let base = QuerySpec::new("")
        .with_param("@k", k)
        .with_param("@embedding", embedding.to_vec());
    let (conditions, query) = filter.apply(vec!["c.type = 'memory'"], base);
    // Cosine similarity: larger is closer.
    let mut query = query.ordered_by(SCORE_FIELD, true).with_top(k);
    query.query = format!(
        "SELECT TOP @k {} FROM c WHERE {} ORDER BY VectorDistance(c.embedding, @embedding)",
        select.join(", "),
        conditions.join(" AND ")
    );
    query
}

fn recent_query(k: usize, filter: &MemoryFilter) -> QuerySpec {
    let (conditions, query) =
        filter.apply(vec!["c.type = 'memory'"], QuerySpec::new("").with_param("@k", k));
    let mut query = query.ordered_by(TIMESTAMP_FIELD, true).with_top(k);
    query.query = format!(
        "SELECT TOP @k c.messages, c.timestamp FROM c WHERE {} ORDER BY c.timestamp DESC",
        conditions.join(" AND ")
    );
    query
}

fn listing_query(filter: &MemoryFilter) -> QuerySpec {
    let (conditions, query) = filter.apply(vec![], QuerySpec::new(""));
    let mut query = query.ordered_by(TIMESTAMP_FIELD, false);
    query.query = format!(
        "SELECT c.messages, c.timestamp FROM c WHERE {} AND c.type = 'memory' ORDER BY c.timestamp ASC",
        conditions.join(" AND ")
    );
    query
}

/// Converts query rows into turns. Rows whose `messages` is not exactly two entries are
/// skipped. Without `detailed`, token counts are stripped and, unless `with_score`, no
/// metadata element is attached.
fn reshape(rows: Vec<Value>, detailed: bool, with_score: bool) -> Result<Vec<RetrievedTurn>> {
    let mut turns = Vec::with_capacity(rows.len());
    for raw in rows {
        let row: TurnRow = serde_json::from_value(raw)?;
        let turn = match Turn::try_from(row.messages) {
            Ok(turn) => turn,
            Err(e) => {
                debug!(error = %e, id = ?row.id, "skipping row without a two-message turn");
                continue;
            }
        };
        let similarity_score = row.similarity_score.filter(|_| with_score);
        let metadata = if detailed {
            Some(TurnMetadata {
                id: row.id,
                user_id: row.user_id,
                thread_id: row.thread_id,
                timestamp: row.timestamp,
                similarity_score,
            })
        } else {
            similarity_score.map(|score| TurnMetadata {
                similarity_score: Some(score),
                ..TurnMetadata::default()
            })
        };
        let turn = if detailed { turn } else { turn.stripped() };
        turns.push(RetrievedTurn { turn, metadata });
    }
    Ok(turns)
}

/// Read side of the memory container.
#[derive(Clone)]
pub struct Retrieval {
    store: Arc<dyn DocumentStore>,
}

impl Retrieval {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Nearest turns to `query_embedding` by vector distance, closest first.
    #[instrument(skip(self, query_embedding), fields(dimensions = query_embedding.len()))]
    pub async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &MemoryFilter,
        options: SearchOptions,
    ) -> Result<Vec<RetrievedTurn>> {
        let query = search_query(query_embedding, k, filter, options);
        let rows = self.store.query(&query, filter.partition()).await?;
        let turns = reshape(rows, options.detailed, options.with_score)?;
        info!(count = turns.len(), "step: memory search done");
        Ok(turns)
    }

    /// The `k` most recent turns, newest first. Requires a user or thread filter.
    #[instrument(skip(self))]
    pub async fn recent(
        &self,
        k: usize,
        filter: &MemoryFilter,
        detailed: bool,
    ) -> Result<Vec<RetrievedTurn>> {
        if filter.is_empty() {
            return Err(MemoryError::Validation(
                "recent requires a user_id or thread_id filter".to_string(),
            ));
        }
        let query = recent_query(k, filter);
        let rows = self.store.query(&query, filter.partition()).await?;
        let turns = reshape(rows, detailed, false)?;
        info!(count = turns.len(), "step: memory recent done");
        Ok(turns)
    }

    /// All turns of one user, oldest first (cross-partition).
    #[instrument(skip(self))]
    pub async fn by_user(&self, user_id: &str, detailed: bool) -> Result<Vec<RetrievedTurn>> {
        let query = listing_query(&MemoryFilter::user(user_id));
        let rows = self.store.query(&query, None).await?;
        reshape(rows, detailed, false)
    }

    /// All turns of one thread, oldest first.
    #[instrument(skip(self))]
    pub async fn by_thread(&self, thread_id: &str, detailed: bool) -> Result<Vec<RetrievedTurn>> {
        let query = listing_query(&MemoryFilter::thread(thread_id));
        let rows = self.store.query(&query, Some(thread_id)).await?;
        reshape(rows, detailed, false)
    }

    /// Any document (memory or summary) by id.
    #[instrument(skip(self))]
    pub async fn by_id(&self, id: &str) -> Result<Option<StoredDocument>> {
        let query = QuerySpec::new("SELECT * FROM c WHERE c.id = @item_id").with_param("@item_id", id);
        let rows = self.store.query(&query, None).await?;
        match rows.into_iter().next() {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    /// The latest summary of a thread by `last_updated`.
    #[instrument(skip(self))]
    pub async fn summary_for_thread(
        &self,
        thread_id: &str,
        detailed: bool,
    ) -> Result<Option<ThreadSummary>> {
        let projection = if detailed {
            "c.summary, c.facts, c.thread_id, c.user_id, c.token_count, c.last_updated"
        } else {
            "c.summary, c.facts"
        };
        let query = QuerySpec::new(format!(
            "SELECT TOP 1 {} FROM c WHERE c.thread_id = @thread_id AND c.type = 'summary' ORDER BY c.last_updated DESC",
            projection
        ))
        .with_param("@thread_id", thread_id);
        let rows = self.store.query(&query, Some(thread_id)).await?;
        let Some(raw) = rows.into_iter().next() else {
            return Ok(None);
        };
        let row: SummaryRow = serde_json::from_value(raw)?;
        let details = detailed.then(|| SummaryDetails {
            thread_id: row.thread_id.unwrap_or_else(|| thread_id.to_string()),
            user_id: row.user_id.unwrap_or_default(),
            token_count: row.token_count.unwrap_or_default(),
            last_updated: row.last_updated.unwrap_or_default(),
        });
        Ok(Some(ThreadSummary {
            summary: row.summary,
            facts: row.facts,
            details,
        }))
    }

    /// Owner of the oldest memory in the thread.
    #[instrument(skip(self))]
    pub async fn first_user_of_thread(&self, thread_id: &str) -> Result<Option<String>> {
        let query = QuerySpec::new(
            "SELECT TOP 1 c.user_id FROM c WHERE c.thread_id = @thread_id AND c.type = 'memory' ORDER BY c.timestamp ASC",
        )
        .with_param("@thread_id", thread_id);
        let rows = self.store.query(&query, Some(thread_id)).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("user_id"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::OrderBy;
    use serde_json::json;

    #[test]
    fn test_search_query_projection_and_params() {
        let filter = MemoryFilter::user("u1");
        let q = search_query(&[0.5, 0.25], 3, &filter, SearchOptions { detailed: true, with_score: true });
        assert_eq!(
            q.query,
            "SELECT TOP @k c.id, c.user_id, c.thread_id, c.timestamp, c.messages, \
             VectorDistance(c.embedding, @embedding) AS similarity_score FROM c \
             WHERE c.type = 'memory' AND c.user_id = @user_id \
             ORDER BY VectorDistance(c.embedding, @embedding)"
        );
        assert_eq!(q.param("@k"), Some(&json!(3)));
        assert_eq!(q.param("@embedding"), Some(&json!([0.5, 0.25])));
        assert_eq!(q.param("@user_id"), Some(&json!("u1")));
        assert!(!q.query.contains("u1"));
        assert_eq!(q.order_by, Some(OrderBy { field: "similarity_score".to_string(), descending: true }));
        assert_eq!(q.top, Some(3));
    }

    #[test]
    fn test_search_query_always_projects_score() {
        let q = search_query(&[0.5], 2, &MemoryFilter::user("u1"), SearchOptions::default());
        assert_eq!(
            q.query,
            "SELECT TOP @k c.messages, VectorDistance(c.embedding, @embedding) AS similarity_score \
             FROM c WHERE c.type = 'memory' AND c.user_id = @user_id \
             ORDER BY VectorDistance(c.embedding, @embedding)"
        );
    }

    #[test]
    fn test_recent_query_filters() {
        let filter = MemoryFilter::user("u1").with_thread("t1");
        let q = recent_query(5, &filter);
        assert_eq!(
            q.query,
            "SELECT TOP @k c.messages, c.timestamp FROM c WHERE c.type = 'memory' AND c.user_id = @user_id \
             AND c.thread_id = @thread_id ORDER BY c.timestamp DESC"
        );
        assert_eq!(filter.partition(), Some("t1"));
        assert_eq!(q.order_by, Some(OrderBy { field: "timestamp".to_string(), descending: true }));
        assert_eq!(q.top, Some(5));
    }

    #[test]
    fn test_listing_query() {
        let q = listing_query(&MemoryFilter::thread("t1"));
        assert_eq!(
            q.query,
            "SELECT c.messages, c.timestamp FROM c WHERE c.thread_id = @thread_id \
             AND c.type = 'memory' ORDER BY c.timestamp ASC"
        );
        assert_eq!(q.order_by, Some(OrderBy { field: "timestamp".to_string(), descending: false }));
        assert_eq!(q.top, None);
    }

    #[test]
    fn test_reshape_skips_malformed_rows() {
        let rows = vec![
            json!({"messages": [{"role": "user", "content": "a", "token_count": 1}]}),
            json!({"messages": [
                {"role": "user", "content": "q", "token_count": 1},
                {"role": "agent", "content": "r", "token_count": 1}
            ]}),
            json!({"id": "x"}),
        ];
        let turns = reshape(rows, false, false).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn.first().token_count, None);
        assert!(turns[0].metadata.is_none());
    }

    #[test]
    fn test_reshape_score_without_details() {
        let rows = vec![json!({
            "messages": [
                {"role": "user", "content": "q", "token_count": 1},
                {"role": "agent", "content": "r", "token_count": 2}
            ],
            "similarity_score": 0.12
        })];
        let turns = reshape(rows.clone(), false, true).unwrap();
        let value = serde_json::to_value(&turns[0]).unwrap();
        assert_eq!(
            value,
            json!([
                {"role": "user", "content": "q"},
                {"role": "agent", "content": "r"},
                {"similarity_score": 0.12}
            ])
        );

        let unscored = reshape(rows, false, false).unwrap();
        assert!(unscored[0].metadata.is_none());
    }
}
