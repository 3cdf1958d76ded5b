//! REST-level tests for [`memory_cosmos::CosmosDocumentStore`] against a mockito server.

use memory_core::{DocumentStore, MemoryError, QuerySpec};
use memory_cosmos::{CosmosConfig, CosmosCredential, CosmosDocumentStore, API_VERSION};
use mockito::Matcher;
use serde_json::json;

const KEY: &str = "dGVzdC1tYXN0ZXIta2V5LTAxMjM0NTY3ODk=";
const DOCS_PATH: &str = "/dbs/MemoryDB/colls/Memories/docs";

fn store(url: &str) -> CosmosDocumentStore {
    let config = CosmosConfig::new(
        format!("{}/", url),
        "MemoryDB",
        "Memories",
        CosmosCredential::MasterKey(KEY.to_string()),
    );
    CosmosDocumentStore::new(config).unwrap()
}

#[tokio::test]
async fn create_sends_partition_key_and_signed_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-documentdb-partitionkey", r#"["t-1"]"#)
        .match_header("x-ms-version", API_VERSION)
        .match_header("x-ms-date", Matcher::Regex(r"^\w{3}, \d{2} \w{3} \d{4} \d{2}:\d{2}:\d{2} GMT$".into()))
        .match_header("authorization", Matcher::Regex("^type%3Dmaster%26ver%3D1.0%26sig%3D".into()))
        .match_body(Matcher::PartialJson(json!({"id": "d-1", "thread_id": "t-1"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "d-1", "thread_id": "t-1", "_etag": "x"}).to_string())
        .create_async()
        .await;

    let stored = store(&server.url())
        .create(json!({"id": "d-1", "thread_id": "t-1"}), "t-1")
        .await
        .unwrap();

    assert_eq!(stored["_etag"], "x");
    mock.assert_async().await;
}

#[tokio::test]
async fn query_follows_continuation_pages() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-documentdb-isquery", "True")
        .match_header("content-type", "application/query+json")
        .match_header("x-ms-documentdb-partitionkey", r#"["t-1"]"#)
        .match_header("x-ms-continuation", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "query": "SELECT * FROM c WHERE c.thread_id = @thread_id",
            "parameters": [{"name": "@thread_id", "value": "t-1"}]
        })))
        .with_status(200)
        .with_header("x-ms-continuation", "page-2")
        .with_body(json!({"Documents": [{"id": "a"}], "_count": 1}).to_string())
        .create_async()
        .await;
    let second = server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-continuation", "page-2")
        .with_status(200)
        .with_body(json!({"Documents": [{"id": "b"}, {"id": "c"}], "_count": 2}).to_string())
        .create_async()
        .await;

    let query = QuerySpec::new("SELECT * FROM c WHERE c.thread_id = @thread_id")
        .with_param("@thread_id", "t-1");
    let docs = store(&server.url()).query(&query, Some("t-1")).await.unwrap();

    let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn query_without_partition_enables_cross_partition() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-documentdb-query-enablecrosspartition", "True")
        .match_header("x-ms-documentdb-partitionkey", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"Documents": []}).to_string())
        .create_async()
        .await;

    let docs = store(&server.url())
        .query(&QuerySpec::new("SELECT * FROM c"), None)
        .await
        .unwrap();

    assert!(docs.is_empty());
    mock.assert_async().await;
}

const PKRANGES_PATH: &str = "/dbs/MemoryDB/colls/Memories/pkranges";

async fn range_mock(server: &mut mockito::ServerGuard, range: &str, rows: serde_json::Value) -> mockito::Mock {
    server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-documentdb-partitionkeyrangeid", range)
        .match_header("x-ms-documentdb-query-enablecrosspartition", "True")
        .match_header("x-ms-documentdb-partitionkey", Matcher::Missing)
        .with_status(200)
        .with_body(json!({ "Documents": rows }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn ordered_cross_partition_query_merges_ranges() {
    let mut server = mockito::Server::new_async().await;
    let ranges = server
        .mock("GET", PKRANGES_PATH)
        .match_header("authorization", Matcher::Regex("^type%3Dmaster%26ver%3D1.0%26sig%3D".into()))
        .with_status(200)
        .with_body(json!({"PartitionKeyRanges": [{"id": "0"}, {"id": "1"}], "_count": 2}).to_string())
        .create_async()
        .await;
    let first = range_mock(
        &mut server,
        "0",
        json!([
            {"id": "a", "timestamp": "2024-05-01T10:00:04.000000Z"},
            {"id": "b", "timestamp": "2024-05-01T10:00:01.000000Z"}
        ]),
    )
    .await;
    let second = range_mock(
        &mut server,
        "1",
        json!([
            {"id": "c", "timestamp": "2024-05-01T10:00:03.000000Z"},
            {"id": "d", "timestamp": "2024-05-01T10:00:02.000000Z"}
        ]),
    )
    .await;

    let query = QuerySpec::new(
        "SELECT TOP @k c.id, c.timestamp FROM c WHERE c.user_id = @user_id ORDER BY c.timestamp DESC",
    )
    .with_param("@k", 3)
    .with_param("@user_id", "u-1")
    .ordered_by("timestamp", true)
    .with_top(3);
    let docs = store(&server.url()).query(&query, None).await.unwrap();

    let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "c", "d"]);
    ranges.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn ordered_query_with_partition_skips_range_listing() {
    let mut server = mockito::Server::new_async().await;
    let ranges = server.mock("GET", PKRANGES_PATH).expect(0).create_async().await;
    let mock = server
        .mock("POST", DOCS_PATH)
        .match_header("x-ms-documentdb-partitionkey", r#"["t-1"]"#)
        .match_header("x-ms-documentdb-partitionkeyrangeid", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"Documents": [{"id": "a"}]}).to_string())
        .create_async()
        .await;

    let query = QuerySpec::new("SELECT c.id, c.timestamp FROM c ORDER BY c.timestamp ASC")
        .ordered_by("timestamp", false);
    let docs = store(&server.url()).query(&query, Some("t-1")).await.unwrap();

    assert_eq!(docs.len(), 1);
    ranges.assert_async().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_missing_document_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/dbs/MemoryDB/colls/Memories/docs/gone")
        .match_header("x-ms-documentdb-partitionkey", r#"["t-1"]"#)
        .with_status(404)
        .with_body(r#"{"code":"NotFound","message":"Entity with the specified id does not exist"}"#)
        .create_async()
        .await;

    let err = store(&server.url()).delete("gone", "t-1").await.unwrap_err();
    assert!(matches!(err, MemoryError::NotFound(_)));
}

#[tokio::test]
async fn delete_succeeds_on_no_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/dbs/MemoryDB/colls/Memories/docs/d-1")
        .with_status(204)
        .create_async()
        .await;

    store(&server.url()).delete("d-1", "t-1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_store_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", DOCS_PATH)
        .with_status(400)
        .with_body(r#"{"code":"BadRequest","message":"Syntax error, incorrect syntax near 'FORM'."}"#)
        .create_async()
        .await;

    let err = store(&server.url())
        .query(&QuerySpec::new("SELECT * FORM c"), None)
        .await
        .unwrap_err();
    match err {
        MemoryError::Store(msg) => assert!(msg.contains("400")),
        other => panic!("expected Store error, got {:?}", other),
    }
}

#[tokio::test]
async fn aad_token_is_sent_as_is() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", DOCS_PATH)
        .match_header("authorization", "type%3Daad%26ver%3D1.0%26sig%3Dabc.def")
        .with_status(200)
        .with_body(json!({"Documents": []}).to_string())
        .create_async()
        .await;

    let config = CosmosConfig::new(
        server.url(),
        "MemoryDB",
        "Memories",
        CosmosCredential::AadToken("abc.def".to_string()),
    );
    CosmosDocumentStore::new(config)
        .unwrap()
        .query(&QuerySpec::new("SELECT * FROM c"), None)
        .await
        .unwrap();
    mock.assert_async().await;
}
