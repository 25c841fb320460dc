//! Record store adapter: deduplication and merge
//!
//! Implements [`IRemoteStore`] on top of [`RestClient`]. The save path is
//! the correctness-critical piece: given a partial payload it collapses any
//! stray duplicate records down to the freshest one, then writes the union
//! of that record's stored fields and the patch, so fields the caller did
//! not touch are never lost.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use carelog_core::domain::newtypes::{AccountId, RecordId};
use carelog_core::domain::record::{RecordPatch, RemoteRecord};
use carelog_core::domain::session::Session;
use carelog_core::ports::remote_store::{IRemoteStore, RemoteError};

use crate::client::RestClient;

/// Keys owned by the backend that must never appear in a write payload
const SERVER_MANAGED_KEYS: [&str; 3] = ["objectId", "createdAt", "updatedAt"];

/// `IRemoteStore` implementation over the backend REST API
pub struct RestRemoteStore {
    client: RestClient,
}

impl RestRemoteStore {
    /// Wraps a configured [`RestClient`]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

/// Serializes a value into a JSON object map
///
/// The domain types serialize infallibly; the fallback branch only guards
/// against a non-object root.
fn to_object<T: serde::Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Builds the write payload: all stored fields of `keep`, overwritten by
/// the field groups present in `patch`
///
/// Backend-managed keys are stripped; everything else — including fields
/// this client does not model — is carried over verbatim.
pub(crate) fn merge_payload(keep: &RemoteRecord, patch: &RecordPatch) -> Map<String, Value> {
    let mut payload = to_object(keep);
    for key in SERVER_MANAGED_KEYS {
        payload.remove(key);
    }
    for (key, value) in to_object(patch) {
        payload.insert(key, value);
    }
    payload
}

/// Sorts records newest-first by backend freshness
/// (`updated_at`, falling back to `created_at`)
fn sort_newest_first(records: &mut [RemoteRecord]) {
    records.sort_by(|a, b| b.freshness().cmp(&a.freshness()));
}

#[async_trait]
impl IRemoteStore for RestRemoteStore {
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session, RemoteError> {
        self.client.sign_up(username, password).await
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<Session, RemoteError> {
        self.client.log_in(username, password).await
    }

    async fn current_account(&self, session: &Session) -> Result<AccountId, RemoteError> {
        self.client.current_account(session).await
    }

    async fn load_record(&self, session: &Session) -> Result<Option<RemoteRecord>, RemoteError> {
        let mut records = self.client.list_records(session).await?;
        if records.is_empty() {
            debug!(account_id = %session.account_id(), "no remote record for account");
            return Ok(None);
        }
        if records.len() > 1 {
            warn!(
                account_id = %session.account_id(),
                count = records.len(),
                "multiple remote records found, using the newest"
            );
            sort_newest_first(&mut records);
        }
        Ok(records.into_iter().next())
    }

    async fn save_record(
        &self,
        session: &Session,
        patch: &RecordPatch,
    ) -> Result<RemoteRecord, RemoteError> {
        let mut records = self.client.list_records(session).await?;

        // No record yet: materialize one from the patch.
        if records.is_empty() {
            debug!(
                account_id = %session.account_id(),
                fields = ?patch.touched_fields(),
                "creating remote record"
            );
            let mut body = to_object(patch);
            body.insert("accountId".to_string(), json!(session.account_id()));
            let created = self.client.create_record(session, &body).await?;
            let record_id = RecordId::new(created.object_id)
                .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
            return Ok(RemoteRecord::from_patch(
                record_id,
                session.account_id().clone(),
                patch,
                created.created_at,
            ));
        }

        // Keep the freshest record, collapse the rest.
        sort_newest_first(&mut records);
        let keep = records.remove(0);
        if !records.is_empty() {
            warn!(
                account_id = %session.account_id(),
                extras = records.len(),
                keep = %keep.record_id,
                "collapsing stray remote records"
            );
        }
        for extra in &records {
            // Best-effort cleanup: a failed delete must not abort the save.
            if let Err(err) = self.client.delete_record(session, &extra.record_id).await {
                warn!(
                    record_id = %extra.record_id,
                    error = %err,
                    "dedup cleanup failed"
                );
            }
        }

        debug!(
            record_id = %keep.record_id,
            fields = ?patch.touched_fields(),
            "updating remote record"
        );
        let merged = merge_payload(&keep, patch);
        let updated = self
            .client
            .update_record(session, &keep.record_id, &merged)
            .await?;

        // Reassemble the stored record from the write payload plus the ids
        // and timestamps the backend owns.
        let mut full = merged;
        full.insert("objectId".to_string(), json!(keep.record_id));
        full.insert("createdAt".to_string(), json!(keep.created_at));
        full.insert("updatedAt".to_string(), json!(updated.updated_at));
        serde_json::from_value(Value::Object(full))
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    async fn check_reachability(&self) -> bool {
        self.client.reachable().await
    }
}
