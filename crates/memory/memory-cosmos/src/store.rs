//! `DocumentStore` implementation over reqwest.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use memory_core::{DocumentStore, MemoryError, OrderBy, QuerySpec, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::auth::rfc1123_date;
use crate::config::CosmosConfig;

/// REST API version sent as `x-ms-version`.
pub const API_VERSION: &str = "2018-12-31";

const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_RANGE_ID: &str = "x-ms-documentdb-partitionkeyrangeid";

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyRangePage {
    #[serde(rename = "PartitionKeyRanges", default)]
    ranges: Vec<PartitionKeyRange>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyRange {
    id: String,
}

/// Where a query runs.
#[derive(Debug, Clone, Copy)]
enum QueryTarget<'a> {
    Partition(&'a str),
    CrossPartition,
    Range(&'a str),
}

/// Cosmos DB container accessed through the REST gateway.
#[derive(Debug, Clone)]
pub struct CosmosDocumentStore {
    client: Client,
    config: CosmosConfig,
}

impl CosmosDocumentStore {
    pub fn new(config: CosmosConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| MemoryError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: CosmosConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CosmosConfig {
        &self.config
    }

    /// Builds a signed request. `resource_link` is what gets signed; `path` is appended to
    /// the endpoint.
    fn request(
        &self,
        method: Method,
        resource_type: &str,
        path: &str,
        resource_link: &str,
    ) -> Result<RequestBuilder> {
        let date = rfc1123_date(Utc::now());
        let authorization = self.config.credential.authorization(
            method.as_str(),
            resource_type,
            resource_link,
            &date,
        )?;
        let url = format!("{}/{}", self.config.base_url(), path);
        Ok(self
            .client
            .request(method, url)
            .header("authorization", authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| MemoryError::Store(format!("Cosmos {} request failed: {}", what, e)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, operation = what, "Cosmos request rejected");
        if status == StatusCode::NOT_FOUND {
            Err(MemoryError::NotFound(format!("Cosmos {}: {}", what, body)))
        } else {
            Err(MemoryError::Store(format!(
                "Cosmos {} failed ({}): {}",
                what, status, body
            )))
        }
    }

    /// Runs a query against one target, following continuation pages.
    async fn query_pages(&self, body: &[u8], target: QueryTarget<'_>) -> Result<Vec<Value>> {
        let link = self.config.collection_link();
        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut builder = self
                .request(Method::POST, "docs", &format!("{}/docs", link), &link)?
                .header("x-ms-documentdb-isquery", "True")
                .header("content-type", "application/query+json")
                .body(body.to_vec());
            builder = match target {
                QueryTarget::Partition(pk) => {
                    builder.header(HEADER_PARTITION_KEY, partition_header(pk)?)
                }
                QueryTarget::CrossPartition => {
                    builder.header("x-ms-documentdb-query-enablecrosspartition", "True")
                }
                QueryTarget::Range(id) => builder
                    .header("x-ms-documentdb-query-enablecrosspartition", "True")
                    .header(HEADER_RANGE_ID, id),
            };
            if let Some(token) = &continuation {
                builder = builder.header(HEADER_CONTINUATION, token.as_str());
            }

            let response = self.send(builder, "query").await?;
            continuation = continuation_token(&response);
            let page: QueryPage = response
                .json()
                .await
                .map_err(|e| MemoryError::Store(format!("Cosmos query response: {}", e)))?;
            pages += 1;
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        debug!(?target, pages, count = documents.len(), "cosmos query pages read");
        Ok(documents)
    }

    /// Lists the ids of the container's partition key ranges.
    async fn partition_key_ranges(&self) -> Result<Vec<String>> {
        let link = self.config.collection_link();
        let mut ids = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut builder =
                self.request(Method::GET, "pkranges", &format!("{}/pkranges", link), &link)?;
            if let Some(token) = &continuation {
                builder = builder.header(HEADER_CONTINUATION, token.as_str());
            }
            let response = self.send(builder, "list partition key ranges").await?;
            continuation = continuation_token(&response);
            let page: PartitionKeyRangePage = response.json().await.map_err(|e| {
                MemoryError::Store(format!("Cosmos partition key ranges response: {}", e))
            })?;
            ids.extend(page.ranges.into_iter().map(|r| r.id));

            if continuation.is_none() {
                break;
            }
        }

        if ids.is_empty() {
            return Err(MemoryError::Store(
                "Cosmos container reported no partition key ranges".to_string(),
            ));
        }
        debug!(ranges = ids.len(), "cosmos partition key ranges listed");
        Ok(ids)
    }
}

fn continuation_token(response: &Response) -> Option<String> {
    response
        .headers()
        .get(HEADER_CONTINUATION)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Merges per-range results: stable sort on the declared key (rows missing it last),
/// then the `TOP` limit.
fn merge_partials(partials: Vec<Vec<Value>>, order_by: Option<&OrderBy>, top: Option<usize>) -> Vec<Value> {
    let mut rows: Vec<Value> = partials.into_iter().flatten().collect();
    if let Some(order) = order_by {
        rows.sort_by(|a, b| compare_rows(a, b, order));
    }
    if let Some(top) = top {
        rows.truncate(top);
    }
    rows
}

fn compare_rows(a: &Value, b: &Value, order: &OrderBy) -> Ordering {
    match (a.get(&order.field), b.get(&order.field)) {
        (Some(x), Some(y)) => {
            let ordering = compare_values(x, y);
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Numbers compare numerically, strings lexically (timestamps are fixed-width RFC 3339).
fn compare_values(x: &Value, y: &Value) -> Ordering {
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => match (x.as_str(), y.as_str()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

fn partition_header(partition_key: &str) -> Result<String> {
    Ok(serde_json::to_string(&[partition_key])?)
}

#[async_trait]
impl DocumentStore for CosmosDocumentStore {
    #[instrument(skip(self, document), fields(partition_key = %partition_key))]
    async fn create(&self, document: Value, partition_key: &str) -> Result<Value> {
        let link = self.config.collection_link();
        let builder = self
            .request(Method::POST, "docs", &format!("{}/docs", link), &link)?
            .header(HEADER_PARTITION_KEY, partition_header(partition_key)?)
            .json(&document);

        let response = self.send(builder, "create").await?;
        let stored: Value = response
            .json()
            .await
            .map_err(|e| MemoryError::Store(format!("Cosmos create response: {}", e)))?;
        info!(
            id = stored.get("id").and_then(serde_json::Value::as_str).unwrap_or_default(),
            "step: cosmos document created"
        );
        Ok(stored)
    }

    #[instrument(skip(self, query), fields(cross_partition = partition_key.is_none()))]
    async fn query(&self, query: &QuerySpec, partition_key: Option<&str>) -> Result<Vec<Value>> {
        debug!(query = %query.query, parameters = query.parameters.len(), "cosmos query");
        let body = serde_json::to_vec(query)?;

        // The gateway cannot serve cross-partition TOP / ORDER BY; run those once per
        // partition key range and merge here.
        let documents = match partition_key {
            Some(pk) => self.query_pages(&body, QueryTarget::Partition(pk)).await?,
            None if query.needs_merge() => {
                let ranges = self.partition_key_ranges().await?;
                let mut partials = Vec::with_capacity(ranges.len());
                for range in &ranges {
                    partials.push(self.query_pages(&body, QueryTarget::Range(range)).await?);
                }
                merge_partials(partials, query.order_by.as_ref(), query.top)
            }
            None => self.query_pages(&body, QueryTarget::CrossPartition).await?,
        };

        info!(count = documents.len(), "step: cosmos query done");
        Ok(documents)
    }

    #[instrument(skip(self), fields(partition_key = %partition_key))]
    async fn delete(&self, id: &str, partition_key: &str) -> Result<()> {
        let link = format!("{}/docs/{}", self.config.collection_link(), id);
        let path = format!(
            "{}/docs/{}",
            self.config.collection_link(),
            urlencoding::encode(id)
        );
        let builder = self
            .request(Method::DELETE, "docs", &path, &link)?
            .header(HEADER_PARTITION_KEY, partition_header(partition_key)?);

        self.send(builder, "delete").await?;
        info!(id = %id, "step: cosmos document deleted");
        Ok(())
    }
}
