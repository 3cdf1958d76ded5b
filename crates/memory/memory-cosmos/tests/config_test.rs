//! Env loading for [`memory_cosmos::CosmosConfig`].

use memory_core::MemoryError;
use memory_cosmos::{CosmosConfig, CosmosCredential};
use serial_test::serial;
use std::env;

fn set_required() {
    env::set_var("AZURE_COSMOS_DB_ENDPOINT", "https://acct.documents.azure.com:443/");
    env::set_var("AZURE_COSMOS_DB_DATABASE", "MemoryDB");
    env::set_var("AZURE_COSMOS_DB_CONTAINER", "Memories");
}

fn clear_env() {
    for key in [
        "AZURE_COSMOS_DB_ENDPOINT",
        "AZURE_COSMOS_DB_DATABASE",
        "AZURE_COSMOS_DB_CONTAINER",
        "AZURE_COSMOS_DB_KEY",
        "AZURE_COSMOS_DB_TOKEN",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_with_master_key() {
    clear_env();
    set_required();
    env::set_var("AZURE_COSMOS_DB_KEY", "a2V5");
    env::set_var("AZURE_COSMOS_DB_TOKEN", "ignored");

    let config = CosmosConfig::from_env().unwrap();
    assert_eq!(config.base_url(), "https://acct.documents.azure.com:443");
    assert_eq!(config.collection_link(), "dbs/MemoryDB/colls/Memories");
    assert_eq!(config.credential, CosmosCredential::MasterKey("a2V5".to_string()));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_with_token() {
    clear_env();
    set_required();
    env::set_var("AZURE_COSMOS_DB_TOKEN", "eyJ0");

    let config = CosmosConfig::from_env().unwrap();
    assert_eq!(config.credential, CosmosCredential::AadToken("eyJ0".to_string()));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_missing_values() {
    clear_env();
    let err = CosmosConfig::from_env().unwrap_err();
    assert_eq!(err, MemoryError::Config("AZURE_COSMOS_DB_ENDPOINT not set".to_string()));

    set_required();
    env::set_var("AZURE_COSMOS_DB_KEY", "   ");
    let err = CosmosConfig::from_env().unwrap_err();
    assert!(matches!(err, MemoryError::Config(msg) if msg.contains("AZURE_COSMOS_DB_KEY")));
    clear_env();
}
