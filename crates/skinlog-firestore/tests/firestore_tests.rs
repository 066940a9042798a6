//! Integration tests for the Firestore adapter
//!
//! Uses wiremock to simulate the Firestore REST API and verifies the
//! request shape (single owner filter, auth header) and response mapping
//! end to end.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skinlog_core::domain::OwnerId;
use skinlog_core::ports::IPhotoRepository;
use skinlog_firestore::FirestorePhotoRepository;

const RUN_QUERY_PATH: &str = "/v1/projects/demo/databases/(default)/documents:runQuery";

fn owner() -> OwnerId {
    OwnerId::new("user-1").unwrap()
}

fn repository(server: &MockServer) -> FirestorePhotoRepository {
    FirestorePhotoRepository::with_base_url(server.uri(), "demo", "photos")
}

fn photo_doc(id: &str, created_at: &str) -> serde_json::Value {
    json!({
        "document": {
            "name": format!("projects/demo/databases/(default)/documents/photos/{id}"),
            "fields": {
                "uid": { "stringValue": "user-1" },
                "dateISO": { "stringValue": "2025-11-02" },
                "url": { "stringValue": format!("https://cdn.example/{id}.jpg") },
                "createdAt": { "timestampValue": created_at }
            }
        }
    })
}

#[tokio::test]
async fn test_list_by_owner_sends_single_field_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "photos" }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "uid" },
                        "op": "EQUAL",
                        "value": { "stringValue": "user-1" }
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            photo_doc("p1", "2025-11-02T09:30:00Z"),
            photo_doc("p2", "2025-11-02T10:15:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = repository(&server).list_by_owner(&owner()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "p1");
    assert_eq!(records[0].owner_id, "user-1");
    assert_eq!(records[0].url, "https://cdn.example/p1.jpg");
    assert_eq!(records[0].date_key, "2025-11-02");
}

#[tokio::test]
async fn test_list_by_owner_attaches_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .and(header("authorization", "Bearer id-token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(&server).with_auth_token("id-token-123");
    let records = repo.list_by_owner(&owner()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_read_time_entries_and_bad_documents_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            // Progress marker with no document
            { "readTime": "2025-11-02T12:00:00Z" },
            photo_doc("good", "2025-11-02T09:30:00Z"),
            // Missing url: skipped, not fatal
            {
                "document": {
                    "name": "projects/demo/databases/(default)/documents/photos/bad",
                    "fields": {
                        "uid": { "stringValue": "user-1" },
                        "createdAt": { "timestampValue": "2025-11-02T09:31:00Z" }
                    }
                }
            }
        ])))
        .mount(&server)
        .await;

    let records = repository(&server).list_by_owner(&owner()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "good");
}

#[tokio::test]
async fn test_server_error_surfaces_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let result = repository(&server).list_by_owner(&owner()).await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("503"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_empty_collection_lists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let records = repository(&server).list_by_owner(&owner()).await.unwrap();
    assert!(records.is_empty());
}
