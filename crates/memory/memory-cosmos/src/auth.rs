//! Request authorization for the Cosmos DB REST API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use memory_core::{MemoryError, Result};
use sha2::Sha256;
use std::fmt;

/// How requests are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum CosmosCredential {
    /// Base64 account master key; each request is signed.
    MasterKey(String),
    /// Pre-acquired Entra ID access token for `https://cosmos.azure.com/.default`.
    AadToken(String),
}

impl fmt::Debug for CosmosCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CosmosCredential::MasterKey(_) => f.write_str("MasterKey(***)"),
            CosmosCredential::AadToken(_) => f.write_str("AadToken(***)"),
        }
    }
}

impl CosmosCredential {
    /// `authorization` header value for one request.
    ///
    /// `resource_link` is the case-sensitive path of the addressed resource (for `docs`
    /// feeds, the parent collection), `date` the exact `x-ms-date` header value.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String> {
        match self {
            CosmosCredential::MasterKey(key) => {
                authorization_token(key, verb, resource_type, resource_link, date)
            }
            CosmosCredential::AadToken(token) => Ok(urlencoding::encode(&format!(
                "type=aad&ver=1.0&sig={}",
                token
            ))
            .into_owned()),
        }
    }
}

/// Master-key signature: `base64(HMAC-SHA256(base64decode(key), payload))`, where payload
/// is `verb\nresourceType\nresourceLink\ndate\n\n` with verb, type and date lower-cased.
pub fn authorization_token(
    master_key: &str,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String> {
    let key = STANDARD
        .decode(master_key.trim())
        .map_err(|e| MemoryError::Config(format!("Cosmos master key is not valid base64: {}", e)))?;
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(&key)
        .map_err(|e| MemoryError::Config(format!("HMAC init: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    Ok(urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned())
}

/// `x-ms-date` format, e.g. `Thu, 27 Apr 2017 00:51:12 GMT`.
pub fn rfc1123_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
