//! Cosmos DB connection settings.

use memory_core::{MemoryError, Result};
use std::env;

use crate::auth::CosmosCredential;

/// Account endpoint, database, container and credential.
#[derive(Debug, Clone)]
pub struct CosmosConfig {
    /// e.g. `https://myaccount.documents.azure.com:443/`
    pub endpoint: String,
    pub database: String,
    pub container: String,
    pub credential: CosmosCredential,
}

impl CosmosConfig {
    pub fn new(
        endpoint: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
        credential: CosmosCredential,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            database: database.into(),
            container: container.into(),
            credential,
        }
    }

    /// Load from environment variables.
    ///
    /// AZURE_COSMOS_DB_ENDPOINT, AZURE_COSMOS_DB_DATABASE and AZURE_COSMOS_DB_CONTAINER are
    /// required, plus one of AZURE_COSMOS_DB_KEY (preferred) or AZURE_COSMOS_DB_TOKEN.
    pub fn from_env() -> Result<Self> {
        let endpoint = required("AZURE_COSMOS_DB_ENDPOINT")?;
        let database = required("AZURE_COSMOS_DB_DATABASE")?;
        let container = required("AZURE_COSMOS_DB_CONTAINER")?;
        let credential = match (optional("AZURE_COSMOS_DB_KEY"), optional("AZURE_COSMOS_DB_TOKEN")) {
            (Some(key), _) => CosmosCredential::MasterKey(key),
            (None, Some(token)) => CosmosCredential::AadToken(token),
            (None, None) => {
                return Err(MemoryError::Config(
                    "AZURE_COSMOS_DB_KEY or AZURE_COSMOS_DB_TOKEN not set".to_string(),
                ))
            }
        };
        Ok(Self::new(endpoint, database, container, credential))
    }

    /// `dbs/{database}/colls/{container}`
    pub fn collection_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    /// Endpoint without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| MemoryError::Config(format!("{} not set", name)))
}
