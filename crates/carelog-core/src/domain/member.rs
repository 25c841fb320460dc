//! Family member entities and per-member datasets
//!
//! A [`Member`] is one person in the household. Every member owns exactly one
//! [`MemberDataset`] holding their health data, organised as seven entry
//! lists. The sync engine treats each [`Entry`] as a black-box tree: only the
//! locally-assigned id is interpreted, everything else is moved verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::newtypes::{EntryId, MemberId};

/// One person in the household
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Locally minted identifier
    pub id: MemberId,
    /// Name shown in the UI
    pub display_name: String,
    /// Relation to the account holder ("self", "parent", "child", ...)
    pub relation: String,
    /// UI accent color tag
    pub color_tag: String,
}

impl Member {
    /// Creates a new member with a freshly minted id
    pub fn new(
        display_name: impl Into<String>,
        relation: impl Into<String>,
        color_tag: impl Into<String>,
    ) -> Self {
        Self {
            id: MemberId::generate(),
            display_name: display_name.into(),
            relation: relation.into(),
            color_tag: color_tag.into(),
        }
    }

    /// The member every fresh installation starts with
    pub fn default_member() -> Self {
        Self {
            id: MemberId::default_member(),
            display_name: "Me".to_string(),
            relation: "self".to_string(),
            color_tag: "indigo".to_string(),
        }
    }
}

/// A single dataset entry (one medication, one lab report, ...)
///
/// Only the id is meaningful to the engine; the payload is an opaque JSON
/// object owned by the forms/views layer and preserved verbatim through
/// every sync round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Locally-assigned unique id
    pub id: EntryId,
    /// Opaque payload fields, flattened alongside the id on the wire
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Entry {
    /// Creates an entry with a freshly minted id and the given payload
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            id: EntryId::generate(),
            payload,
        }
    }
}

/// The kind of entry list inside a [`MemberDataset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Medication,
    CatalogEntry,
    Checkup,
    LabReport,
    ImagingReport,
    ClinicalDocument,
    VitalRecord,
}

impl EntryKind {
    /// All entry kinds, in dataset field order
    pub const ALL: [EntryKind; 7] = [
        EntryKind::Medication,
        EntryKind::CatalogEntry,
        EntryKind::Checkup,
        EntryKind::LabReport,
        EntryKind::ImagingReport,
        EntryKind::ClinicalDocument,
        EntryKind::VitalRecord,
    ];
}

/// All health data owned by one member
///
/// Missing lists deserialize as empty so records written by older clients
/// (or partial payloads) load cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberDataset {
    pub medications: Vec<Entry>,
    pub catalog_entries: Vec<Entry>,
    pub checkups: Vec<Entry>,
    pub lab_reports: Vec<Entry>,
    pub imaging_reports: Vec<Entry>,
    pub clinical_documents: Vec<Entry>,
    pub vital_records: Vec<Entry>,
}

impl MemberDataset {
    /// Returns the entry list for the given kind
    pub fn list(&self, kind: EntryKind) -> &Vec<Entry> {
        match kind {
            EntryKind::Medication => &self.medications,
            EntryKind::CatalogEntry => &self.catalog_entries,
            EntryKind::Checkup => &self.checkups,
            EntryKind::LabReport => &self.lab_reports,
            EntryKind::ImagingReport => &self.imaging_reports,
            EntryKind::ClinicalDocument => &self.clinical_documents,
            EntryKind::VitalRecord => &self.vital_records,
        }
    }

    /// Returns the mutable entry list for the given kind
    pub fn list_mut(&mut self, kind: EntryKind) -> &mut Vec<Entry> {
        match kind {
            EntryKind::Medication => &mut self.medications,
            EntryKind::CatalogEntry => &mut self.catalog_entries,
            EntryKind::Checkup => &mut self.checkups,
            EntryKind::LabReport => &mut self.lab_reports,
            EntryKind::ImagingReport => &mut self.imaging_reports,
            EntryKind::ClinicalDocument => &mut self.clinical_documents,
            EntryKind::VitalRecord => &mut self.vital_records,
        }
    }

    /// Total number of entries across all lists
    pub fn entry_count(&self) -> usize {
        EntryKind::ALL.iter().map(|k| self.list(*k).len()).sum()
    }

    /// Returns true if every list is empty
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}
