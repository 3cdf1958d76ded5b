//! # Cosmos DB Document Store
//!
//! [`DocumentStore`](memory_core::DocumentStore) over the Azure Cosmos DB NoSQL REST API.
//!
//! ## Operations
//!
//! - **create**: `POST dbs/{db}/colls/{coll}/docs` in the partition of the document
//! - **query**: parameterized SQL with continuation paging; pinned to one partition or
//!   cross-partition. Cross-partition queries that declare an order or `TOP` run once per
//!   partition key range and are merged client-side.
//! - **delete**: `DELETE dbs/{db}/colls/{coll}/docs/{id}`
//!
//! ## Authentication
//!
//! Either the account master key (HMAC-SHA256 request signature) or a pre-acquired
//! Entra ID bearer token. See [`CosmosCredential`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use memory_core::{DocumentStore, QuerySpec};
//! use memory_cosmos::{CosmosConfig, CosmosDocumentStore};
//!
//! async fn example() -> memory_core::Result<()> {
//!     let store = CosmosDocumentStore::new(CosmosConfig::from_env()?)?;
//!     let query = QuerySpec::new("SELECT * FROM c WHERE c.thread_id = @thread_id")
//!         .with_param("@thread_id", "t-1");
//!     let docs = store.query(&query, Some("t-1")).await?;
//!     println!("{} documents", docs.len());
//!     Ok(())
//! }
//! ```

mod auth;
mod config;
mod store;

pub use auth::{authorization_token, rfc1123_date, CosmosCredential};
pub use config::CosmosConfig;
pub use store::{CosmosDocumentStore, API_VERSION};
