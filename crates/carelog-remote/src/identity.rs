//! Credential and installation-state storage adapters
//!
//! ## Components
//!
//! - [`KeyringCredentialStore`] - Persists the session credentials in the
//!   OS credential store (GNOME Keyring, KDE Wallet, macOS Keychain)
//! - [`FileStateStore`] - Flat key→string JSON file for installation state
//!   (device id, last-seen app version)

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use carelog_core::domain::session::Session;
use carelog_core::ports::credential_store::ICredentialStore;
use carelog_core::ports::state_store::ILocalStateStore;

/// Keyring service name for storing the session
const KEYRING_SERVICE: &str = "carelog";

/// Keyring username under which the session is stored
const KEYRING_USER: &str = "session";

// ============================================================================
// KeyringCredentialStore
// ============================================================================

/// Stores the serialized session in the system keyring
///
/// The session is serialized as JSON with the service name "carelog" and a
/// fixed username, since one installation holds at most one session.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    /// Creates a store using the default service name
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Creates a store with a custom service name (useful for testing)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, KEYRING_USER).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ICredentialStore for KeyringCredentialStore {
    fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).context("Failed to serialize session")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store session in keyring")?;
        debug!(account_id = %session.account_id(), "Stored session in keyring");
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let session: Session = serde_json::from_str(&json)
                    .context("Failed to deserialize session from keyring")?;
                debug!(account_id = %session.account_id(), "Loaded session from keyring");
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!("Cleared session from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

// ============================================================================
// FileStateStore
// ============================================================================

/// Flat key→string store backed by a JSON file
///
/// Holds the per-installation state that must survive restarts but is not
/// secret: the device id and the last-seen app version marker. Writes go
/// through a full rewrite of the small file; no locking, since only one
/// process owns the installation state.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store over the given file (created lazily on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform-appropriate default path for the state file
    ///
    /// Typically `$XDG_DATA_HOME/carelog/state.json` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carelog")
            .join("state.json")
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed state file {}", self.path.display()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(map).context("Failed to serialize state")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file {}", self.path.display()))
    }
}

impl ILocalStateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
