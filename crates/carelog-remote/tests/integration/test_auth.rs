//! Authentication and error-classification tests

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use carelog_core::ports::remote_store::{IRemoteStore, RemoteError};
use carelog_remote::{RestClient, RestRemoteStore};

use crate::common::{setup_store, test_session};

#[tokio::test]
async fn login_returns_session() {
    let (server, store) = setup_store().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("X-App-Id", "test-app-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": "acc-42",
            "sessionToken": "sess-42",
            "username": "ada",
        })))
        .mount(&server)
        .await;

    let session = store.log_in("ada", "hunter42").await.unwrap();
    assert_eq!(session.account_id().as_str(), "acc-42");
    assert_eq!(session.token().as_str(), "sess-42");
}

#[tokio::test]
async fn login_with_bad_credentials_is_auth_failed() {
    let (server, store) = setup_store().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "invalid username or password" })),
        )
        .mount(&server)
        .await;

    let err = store.log_in("ada", "wrong").await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::AuthFailed("invalid username or password".to_string())
    );
}

#[tokio::test]
async fn sign_up_returns_session() {
    let (server, store) = setup_store().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "objectId": "acc-new",
            "sessionToken": "sess-new",
        })))
        .mount(&server)
        .await;

    let session = store.sign_up("ada", "hunter42").await.unwrap();
    assert_eq!(session.account_id().as_str(), "acc-new");
}

#[tokio::test]
async fn sign_up_conflict_is_a_request_error() {
    let (server, store) = setup_store().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "username already taken" })),
        )
        .mount(&server)
        .await;

    let err = store.sign_up("ada", "hunter42").await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Request {
            status: 409,
            message: "username already taken".to_string(),
        }
    );
}

#[tokio::test]
async fn current_account_validates_session() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("X-Session-Token", "sess-test-001"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "objectId": "acc-test-001" })),
        )
        .mount(&server)
        .await;

    let account_id = store.current_account(&test_session()).await.unwrap();
    assert_eq!(account_id.as_str(), "acc-test-001");
}

#[tokio::test]
async fn expired_session_is_auth_failed() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid session" })))
        .mount(&server)
        .await;

    let err = store.current_account(&test_session()).await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn server_errors_classify_by_family() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = store.current_account(&test_session()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Server { status: 503, .. }));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = store.current_account(&test_session()).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));
}

#[tokio::test]
async fn transport_failure_is_a_network_error() {
    // Nothing listens on port 1; the connection is refused before any
    // HTTP exchange happens.
    let client = RestClient::with_base_url("http://127.0.0.1:1", "app", "key");
    let store = RestRemoteStore::new(client);

    let err = store.log_in("ada", "pw").await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn reachability_counts_any_response() {
    let (server, store) = setup_store().await;

    // Even an error status proves the backend is reachable.
    Mock::given(method("GET"))
        .and(path("/date"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(store.check_reachability().await);
}

#[tokio::test]
async fn reachability_false_when_unreachable() {
    let client = RestClient::with_base_url("http://127.0.0.1:1", "app", "key");
    let store = RestRemoteStore::new(client);
    assert!(!store.check_reachability().await);
}
