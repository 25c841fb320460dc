//! Process-wide synchronization status
//!
//! Observed by the UI; transitions only through the sync engine:
//! `Idle --push/pull--> Syncing --success--> Synced`,
//! `Syncing --failure--> Error`. No state is terminal; `Error` is escaped
//! by the next successful attempt.

use serde::{Deserialize, Serialize};

/// Current state of the sync engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No sync has happened yet (fresh start or after logout)
    #[default]
    Idle,
    /// A push or pull is in progress
    Syncing,
    /// The last sync attempt succeeded
    Synced,
    /// The last sync attempt failed; the next attempt may recover
    Error,
}

impl SyncStatus {
    /// Returns true while a sync operation is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}
