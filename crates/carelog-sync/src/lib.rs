//! CareLog Sync - The synchronization engine
//!
//! Provides:
//! - Push/pull reconciliation against the account's single remote record
//! - A drop-not-queue single-flight guard serializing pushes
//! - Debounced auto-push driven by local mutation notifications
//! - Session lifecycle (signup, login, logout, restore)
//! - Startup sequencing with the version gate
//!
//! ## Modules
//!
//! - [`engine`] - The sync engine: push/pull, guard, status reporting
//! - [`scheduler`] - Debounced auto-push scheduler
//! - [`session`] - Session manager (signup/login/logout/restore)
//! - [`gate`] - Version gate, device identity, and startup bootstrap

pub mod engine;
pub mod gate;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Errors surfaced by session and startup operations
///
/// Background pushes never surface these: they fail silently into
/// [`SyncStatus::Error`](carelog_core::domain::SyncStatus) and the next
/// attempt retries.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Client-side validation failure; nothing was sent over the network
    #[error("invalid input: {0}")]
    Validation(#[from] carelog_core::domain::DomainError),

    /// A classified backend failure
    #[error(transparent)]
    Remote(#[from] carelog_core::ports::RemoteError),

    /// Credential or installation-state storage failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
