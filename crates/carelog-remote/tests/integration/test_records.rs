//! Dedup/merge save path and record loading tests

use chrono::Utc;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use carelog_core::domain::newtypes::DeviceId;
use carelog_core::domain::record::RecordPatch;
use carelog_core::domain::store::LocalStore;
use carelog_core::ports::remote_store::IRemoteStore;

use crate::common::{
    mount_create, mount_records_query, mount_update, record_json, setup_store, test_session,
};

#[tokio::test]
async fn save_creates_record_when_account_has_none() {
    let (server, store) = setup_store().await;
    mount_records_query(&server, json!([])).await;
    mount_create(&server, "rec-new").await;

    let local = LocalStore::with_defaults();
    let device = DeviceId::generate();
    let patch = local.initial_patch(&device, Utc::now());

    let record = store.save_record(&test_session(), &patch).await.unwrap();

    assert_eq!(record.record_id.as_str(), "rec-new");
    assert_eq!(record.account_id.as_str(), "acc-test-001");
    assert_eq!(record.members.len(), 1);
    assert_eq!(record.device_id, Some(device));

    // The create body carries the account id alongside the patch fields.
    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(body["accountId"], "acc-test-001");
    assert!(body["members"].is_array());
}

#[tokio::test]
async fn stray_records_collapse_to_the_newest() {
    let (server, store) = setup_store().await;

    // R1 is older and carries a field R2 never had; R2 is the keeper.
    let r1 = record_json("rec-r1", "2026-01-10T00:00:00Z", json!({ "a": 1 }));
    let r2 = record_json("rec-r2", "2026-02-10T00:00:00Z", json!({ "b": 2 }));
    mount_records_query(&server, json!([r1, r2])).await;

    Mock::given(method("DELETE"))
        .and(path("/records/rec-r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    mount_update(&server, "rec-r2").await;

    let patch = RecordPatch {
        api_settings: Some(json!({ "c": 3 })),
        ..RecordPatch::default()
    };
    let record = store.save_record(&test_session(), &patch).await.unwrap();

    // The survivor is R2's union with the patch; R1's data is gone.
    assert_eq!(record.record_id.as_str(), "rec-r2");
    assert_eq!(record.extra["b"], 2);
    assert_eq!(record.api_settings, Some(json!({ "c": 3 })));
    assert!(!record.extra.contains_key("a"));
}

#[tokio::test]
async fn merge_preserves_fields_absent_from_the_patch() {
    let (server, store) = setup_store().await;

    let stored = record_json(
        "rec-1",
        "2026-02-01T00:00:00Z",
        json!({
            "members": [
                {"id": "m-1", "displayName": "Ada", "relation": "self", "colorTag": "rose"}
            ],
            "sharedDictionaries": [{"name": "ALT"}],
        }),
    );
    mount_records_query(&server, json!([stored])).await;
    mount_update(&server, "rec-1").await;

    let device = DeviceId::generate();
    let patch = RecordPatch::device_presence(&device, Utc::now());
    store.save_record(&test_session(), &patch).await.unwrap();

    // Inspect the PUT body: untouched groups must be written back verbatim.
    let requests = server.received_requests().await.unwrap();
    let update = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: Value = serde_json::from_slice(&update.body).unwrap();

    assert_eq!(body["deviceId"], json!(device));
    assert_eq!(body["members"][0]["displayName"], "Ada");
    assert_eq!(body["sharedDictionaries"][0]["name"], "ALT");
    assert!(body.get("objectId").is_none());
}

#[tokio::test]
async fn dedup_cleanup_failure_does_not_abort_the_save() {
    let (server, store) = setup_store().await;

    let r1 = record_json("rec-r1", "2026-01-10T00:00:00Z", json!({}));
    let r2 = record_json("rec-r2", "2026-02-10T00:00:00Z", json!({}));
    mount_records_query(&server, json!([r1, r2])).await;

    Mock::given(method("DELETE"))
        .and(path("/records/rec-r1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_update(&server, "rec-r2").await;

    let patch = RecordPatch::device_presence(&DeviceId::generate(), Utc::now());
    let record = store.save_record(&test_session(), &patch).await.unwrap();
    assert_eq!(record.record_id.as_str(), "rec-r2");
}

#[tokio::test]
async fn load_record_returns_none_for_empty_account() {
    let (server, store) = setup_store().await;
    mount_records_query(&server, json!([])).await;

    let record = store.load_record(&test_session()).await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn load_record_picks_the_newest_stray() {
    let (server, store) = setup_store().await;

    let r1 = record_json("rec-r1", "2026-01-10T00:00:00Z", json!({}));
    let r2 = record_json("rec-r2", "2026-02-10T00:00:00Z", json!({}));
    mount_records_query(&server, json!([r1, r2])).await;

    let record = store.load_record(&test_session()).await.unwrap().unwrap();
    assert_eq!(record.record_id.as_str(), "rec-r2");

    // Loading never deletes strays; cleanup happens on the next save.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}
