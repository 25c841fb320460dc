//! Credential storage port (driven/secondary port)
//!
//! Durable storage for the authenticated session, so restarts re-enter the
//! authenticated state without re-prompting. The primary implementation
//! stores the serialized session in the system keyring.
//!
//! Uses `anyhow::Result` because storage errors are adapter-specific and
//! don't need domain-level classification.

use crate::domain::session::Session;

/// Port trait for persisting the session credentials
pub trait ICredentialStore: Send + Sync {
    /// Persists the session, replacing any previous one
    fn save(&self, session: &Session) -> anyhow::Result<()>;

    /// Loads the persisted session, or `None` when signed out
    fn load(&self) -> anyhow::Result<Option<Session>>;

    /// Removes the persisted session (logout, version gate, auth rejection)
    ///
    /// Clearing an already-empty store is not an error.
    fn clear(&self) -> anyhow::Result<()>;
}
