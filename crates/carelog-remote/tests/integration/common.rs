//! Shared test helpers for backend integration tests
//!
//! Provides wiremock-based mock server setup for the backend endpoints.
//! Each helper mounts the necessary mock endpoints and returns a configured
//! adapter pointing at the mock server.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carelog_core::domain::newtypes::{AccountId, SessionToken};
use carelog_core::domain::session::Session;
use carelog_remote::{RestClient, RestRemoteStore};

/// Account id used by [`test_session`] and the query helpers
pub const TEST_ACCOUNT: &str = "acc-test-001";

/// Starts a mock server and returns it with an adapter pointing at it
pub async fn setup_store() -> (MockServer, RestRemoteStore) {
    let server = MockServer::start().await;
    let client = RestClient::with_base_url(server.uri(), "test-app-id", "test-app-key");
    (server, RestRemoteStore::new(client))
}

/// A session for [`TEST_ACCOUNT`]
pub fn test_session() -> Session {
    Session::new(
        AccountId::new(TEST_ACCOUNT).unwrap(),
        SessionToken::new("sess-test-001").unwrap(),
    )
}

/// The `where` constraint the client sends when listing records
pub fn where_constraint() -> String {
    json!({ "accountId": TEST_ACCOUNT }).to_string()
}

/// Builds a stored-record body with the given id, freshness, and fields
pub fn record_json(record_id: &str, updated_at: &str, fields: Value) -> Value {
    let mut body = json!({
        "objectId": record_id,
        "accountId": TEST_ACCOUNT,
        "createdAt": "2026-01-01T00:00:00Z",
        "updatedAt": updated_at,
    });
    if let (Value::Object(base), Value::Object(extra)) = (&mut body, fields) {
        for (key, value) in extra {
            base.insert(key, value);
        }
    }
    body
}

/// Mounts the record query endpoint returning the given results
pub async fn mount_records_query(server: &MockServer, results: Value) {
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("where", where_constraint()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

/// Mounts the update endpoint for a specific record id
pub async fn mount_update(server: &MockServer, record_id: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/records/{record_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "updatedAt": "2026-03-01T00:00:00Z" })),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts the create endpoint returning a fresh record id
pub async fn mount_create(server: &MockServer, record_id: &str) {
    Mock::given(method("POST"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "objectId": record_id,
            "createdAt": "2026-03-01T00:00:00Z",
        })))
        .expect(1)
        .mount(server)
        .await;
}
