//! The in-memory local store
//!
//! Holds all per-member health data plus the shared dictionaries. Created
//! empty at install; populated wholesale from the remote record on login
//! (or seeded with defaults when the account has no record yet); mutated by
//! the CRUD layer; read (snapshotted into a [`RecordPatch`]) by the sync
//! engine. It is never persisted directly — durability goes through the
//! engine's push path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::errors::DomainError;
use super::member::{Member, MemberDataset};
use super::newtypes::{DeviceId, MemberId};
use super::record::{RecordPatch, RemoteRecord};

/// In-memory representation of all synchronized state
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    members: Vec<Member>,
    active_member_id: Option<MemberId>,
    datasets: BTreeMap<MemberId, MemberDataset>,
    shared_dictionaries: Option<Value>,
    api_settings: Option<Value>,
    loaded: bool,
}

impl LocalStore {
    /// Creates an empty, unloaded store (install-time state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the default member and empty dictionaries
    ///
    /// Used when pulling an account that has no remote record yet.
    pub fn with_defaults() -> Self {
        let member = Member::default_member();
        let mut datasets = BTreeMap::new();
        datasets.insert(member.id.clone(), MemberDataset::default());
        Self {
            active_member_id: Some(member.id.clone()),
            members: vec![member],
            datasets,
            shared_dictionaries: Some(Value::Array(Vec::new())),
            api_settings: None,
            loaded: true,
        }
    }

    /// Replaces the entire store contents from a remote record
    ///
    /// Pull is a full snapshot load: no field-level merging happens here,
    /// unlike the push path. A record with no members falls back to the
    /// default member so the UI always has someone to show.
    pub fn replace_from_record(&mut self, record: &RemoteRecord) {
        if record.members.is_empty() {
            let defaults = Self::with_defaults();
            self.members = defaults.members;
            self.datasets = defaults.datasets;
            self.active_member_id = defaults.active_member_id;
        } else {
            self.members = record.members.clone();
            self.datasets = record.member_datasets.clone();
            self.active_member_id = Some(
                record
                    .active_member_id
                    .clone()
                    .filter(|id| record.members.iter().any(|m| &m.id == id))
                    .unwrap_or_else(|| record.members[0].id.clone()),
            );
        }
        self.shared_dictionaries = record.shared_dictionaries.clone();
        self.api_settings = record.api_settings.clone();
        self.loaded = true;
    }

    /// Clears everything back to the install-time state (logout)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true once the store has been populated (pull or defaults)
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    // --- Members ---

    /// The household members
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// The currently selected member, if any
    pub fn active_member(&self) -> Option<&Member> {
        let id = self.active_member_id.as_ref()?;
        self.members.iter().find(|m| &m.id == id)
    }

    /// Selects a member
    ///
    /// # Errors
    /// Returns `MemberNotFound` if no member has the given id
    pub fn set_active_member(&mut self, id: &MemberId) -> Result<(), DomainError> {
        if !self.members.iter().any(|m| &m.id == id) {
            return Err(DomainError::MemberNotFound(id.to_string()));
        }
        self.active_member_id = Some(id.clone());
        Ok(())
    }

    /// Adds a member with an empty dataset and selects it
    pub fn add_member(&mut self, member: Member) {
        self.datasets
            .insert(member.id.clone(), MemberDataset::default());
        self.active_member_id = Some(member.id.clone());
        self.members.push(member);
    }

    /// Removes a member and its dataset
    ///
    /// # Errors
    /// Returns `LastMember` when only one member remains, `MemberNotFound`
    /// if no member has the given id
    pub fn remove_member(&mut self, id: &MemberId) -> Result<(), DomainError> {
        if self.members.len() <= 1 {
            return Err(DomainError::LastMember);
        }
        let index = self
            .members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| DomainError::MemberNotFound(id.to_string()))?;
        self.members.remove(index);
        self.datasets.remove(id);
        if self.active_member_id.as_ref() == Some(id) {
            self.active_member_id = self.members.first().map(|m| m.id.clone());
        }
        Ok(())
    }

    // --- Datasets ---

    /// The dataset of the given member, if present
    pub fn dataset(&self, id: &MemberId) -> Option<&MemberDataset> {
        self.datasets.get(id)
    }

    /// The mutable dataset of the given member, created on first access
    ///
    /// # Errors
    /// Returns `MemberNotFound` if no member has the given id
    pub fn dataset_mut(&mut self, id: &MemberId) -> Result<&mut MemberDataset, DomainError> {
        if !self.members.iter().any(|m| &m.id == id) {
            return Err(DomainError::MemberNotFound(id.to_string()));
        }
        Ok(self.datasets.entry(id.clone()).or_default())
    }

    // --- Shared dictionaries / settings ---

    /// The shared dictionaries blob, opaque to the engine
    pub fn shared_dictionaries(&self) -> Option<&Value> {
        self.shared_dictionaries.as_ref()
    }

    /// Replaces the shared dictionaries blob
    pub fn set_shared_dictionaries(&mut self, dictionaries: Value) {
        self.shared_dictionaries = Some(dictionaries);
    }

    /// The per-account provider settings blob, opaque to the engine
    pub fn api_settings(&self) -> Option<&Value> {
        self.api_settings.as_ref()
    }

    /// Replaces the per-account provider settings blob
    pub fn set_api_settings(&mut self, settings: Value) {
        self.api_settings = Some(settings);
    }

    // --- Snapshots for the push path ---

    /// Builds the full data patch the debounced auto-push sends
    ///
    /// Carries everything except the device marker, which is written only
    /// by the presence ping and the initial seed.
    pub fn snapshot_patch(&self, now: DateTime<Utc>) -> RecordPatch {
        RecordPatch {
            members: Some(self.members.clone()),
            active_member_id: self.active_member_id.clone(),
            member_datasets: Some(self.datasets.clone()),
            shared_dictionaries: self.shared_dictionaries.clone(),
            api_settings: self.api_settings.clone(),
            last_updated_at: Some(now),
            ..RecordPatch::default()
        }
    }

    /// Builds the patch that seeds an account's first remote record
    ///
    /// Like [`snapshot_patch`](Self::snapshot_patch) but also stamps the
    /// creating device.
    pub fn initial_patch(&self, device_id: &DeviceId, now: DateTime<Utc>) -> RecordPatch {
        RecordPatch {
            device_id: Some(device_id.clone()),
            last_active_at: Some(now),
            ..self.snapshot_patch(now)
        }
    }
}
