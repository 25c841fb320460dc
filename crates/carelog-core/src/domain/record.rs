//! The authoritative remote record and its partial write payload
//!
//! A [`RemoteRecord`] is the single server-side document holding one
//! account's full synchronized state. A [`RecordPatch`] is the partial
//! payload a client pushes: only the field groups present in the patch
//! overwrite remote state, everything else is preserved by the merge in
//! the save path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::member::{Member, MemberDataset};
use super::newtypes::{AccountId, DeviceId, MemberId, RecordId};

/// The authoritative server-side document for an account
///
/// Invariant: at most one record may exist per account. Stray duplicates
/// created by device races are collapsed by the dedup/merge save path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    /// Backend-assigned record id
    #[serde(rename = "objectId")]
    pub record_id: RecordId,
    /// Owning account
    pub account_id: AccountId,
    /// Household members
    #[serde(default)]
    pub members: Vec<Member>,
    /// The member selected in the UI when the record was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_member_id: Option<MemberId>,
    /// Per-member health data, keyed by member id
    #[serde(default)]
    pub member_datasets: BTreeMap<MemberId, MemberDataset>,
    /// Shared dictionaries (lab indicator names etc.), opaque to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_dictionaries: Option<Value>,
    /// Per-account document-recognition provider settings, opaque to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_settings: Option<Value>,
    /// Device that last wrote this record (diagnostic marker only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    /// Client-stamped time of the last full data write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Client-stamped time of the last device-presence ping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<DateTime<Utc>>,
    /// Backend-stamped creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Backend-stamped time of the last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields written by newer clients that this client does not model
    ///
    /// Captured so the merge in the save path never drops them: a stored
    /// field this client does not understand is still an untouched field.
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, Value>,
}

impl RemoteRecord {
    /// Backend-stamped freshness: `updated_at`, falling back to `created_at`
    ///
    /// Used to pick the record to keep when stray duplicates exist.
    pub fn freshness(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    /// Builds the record materialized by creating `patch` for `account_id`
    ///
    /// Used on the create path, where the backend returns only the new
    /// record's id and creation time.
    pub fn from_patch(
        record_id: RecordId,
        account_id: AccountId,
        patch: &RecordPatch,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id,
            account_id,
            members: patch.members.clone().unwrap_or_default(),
            active_member_id: patch.active_member_id.clone(),
            member_datasets: patch.member_datasets.clone().unwrap_or_default(),
            shared_dictionaries: patch.shared_dictionaries.clone(),
            api_settings: patch.api_settings.clone(),
            device_id: patch.device_id.clone(),
            last_updated_at: patch.last_updated_at,
            last_active_at: patch.last_active_at,
            created_at: Some(created_at),
            updated_at: Some(created_at),
            extra: serde_json::Map::new(),
        }
    }
}

/// Partial write payload for a remote record
///
/// Every field group is optional; absent groups never touch remote state.
/// Serialization skips absent groups so the merge can treat the serialized
/// patch as "the keys the caller intends to overwrite".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_member_id: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_datasets: Option<BTreeMap<MemberId, MemberDataset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_dictionaries: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// The lightweight "this device is active" ping payload
    ///
    /// Touches only the device marker and its timestamp, so it can run with
    /// the single-flight guard bypassed without clobbering data fields.
    pub fn device_presence(device_id: &DeviceId, now: DateTime<Utc>) -> Self {
        Self {
            device_id: Some(device_id.clone()),
            last_active_at: Some(now),
            ..Self::default()
        }
    }

    /// Returns true if no field group is present
    pub fn is_empty(&self) -> bool {
        self.members.is_none()
            && self.active_member_id.is_none()
            && self.member_datasets.is_none()
            && self.shared_dictionaries.is_none()
            && self.api_settings.is_none()
            && self.device_id.is_none()
            && self.last_updated_at.is_none()
            && self.last_active_at.is_none()
    }

    /// Names of the field groups present in this patch, for logging
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.members.is_some() {
            fields.push("members");
        }
        if self.active_member_id.is_some() {
            fields.push("activeMemberId");
        }
        if self.member_datasets.is_some() {
            fields.push("memberDatasets");
        }
        if self.shared_dictionaries.is_some() {
            fields.push("sharedDictionaries");
        }
        if self.api_settings.is_some() {
            fields.push("apiSettings");
        }
        if self.device_id.is_some() {
            fields.push("deviceId");
        }
        if self.last_updated_at.is_some() {
            fields.push("lastUpdatedAt");
        }
        if self.last_active_at.is_some() {
            fields.push("lastActiveAt");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(updated_at: Option<&str>, created_at: Option<&str>) -> RemoteRecord {
        serde_json::from_value(json!({
            "objectId": "rec-1",
            "accountId": "acc-1",
            "updatedAt": updated_at,
            "createdAt": created_at,
        }))
        .unwrap()
    }

    #[test]
    fn test_freshness_prefers_updated_at() {
        let rec = record(Some("2026-02-01T00:00:00Z"), Some("2026-01-01T00:00:00Z"));
        assert_eq!(
            rec.freshness().unwrap().to_rfc3339(),
            "2026-02-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_freshness_falls_back_to_created_at() {
        let rec = record(None, Some("2026-01-01T00:00:00Z"));
        assert_eq!(
            rec.freshness().unwrap().to_rfc3339(),
            "2026-01-01T00:00:00+00:00"
        );
        assert!(record(None, None).freshness().is_none());
    }

    #[test]
    fn test_record_deserializes_with_missing_data_fields() {
        let rec = record(None, None);
        assert!(rec.members.is_empty());
        assert!(rec.member_datasets.is_empty());
        assert!(rec.device_id.is_none());
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn test_record_preserves_unknown_fields() {
        let rec: RemoteRecord = serde_json::from_value(json!({
            "objectId": "rec-1",
            "accountId": "acc-1",
            "futureField": {"written_by": "a newer client"},
        }))
        .unwrap();

        assert_eq!(rec.extra["futureField"]["written_by"], "a newer client");
        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["futureField"]["written_by"], "a newer client");
    }

    #[test]
    fn test_patch_serialization_skips_absent_groups() {
        let device = DeviceId::generate();
        let patch = RecordPatch::device_presence(&device, Utc::now());
        let json = serde_json::to_value(&patch).unwrap();

        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["deviceId", "lastActiveAt"]);
    }

    #[test]
    fn test_empty_patch() {
        let patch = RecordPatch::default();
        assert!(patch.is_empty());
        assert!(patch.touched_fields().is_empty());
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({}));
    }

    #[test]
    fn test_touched_fields() {
        let device = DeviceId::generate();
        let patch = RecordPatch::device_presence(&device, Utc::now());
        assert_eq!(patch.touched_fields(), ["deviceId", "lastActiveAt"]);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_from_patch_materializes_record() {
        let device = DeviceId::generate();
        let now = Utc::now();
        let patch = RecordPatch {
            members: Some(vec![Member::default_member()]),
            active_member_id: Some(MemberId::default_member()),
            device_id: Some(device.clone()),
            last_updated_at: Some(now),
            ..RecordPatch::default()
        };

        let rec = RemoteRecord::from_patch(
            RecordId::new("rec-9").unwrap(),
            AccountId::new("acc-9").unwrap(),
            &patch,
            now,
        );

        assert_eq!(rec.record_id.as_str(), "rec-9");
        assert_eq!(rec.members.len(), 1);
        assert_eq!(rec.device_id, Some(device));
        assert_eq!(rec.created_at, Some(now));
        assert_eq!(rec.updated_at, Some(now));
    }
}
