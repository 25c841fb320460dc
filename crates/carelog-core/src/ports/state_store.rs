//! Installation state storage port (driven/secondary port)
//!
//! A flat key→string store for per-installation state: the device id and
//! the last-seen app version marker. No schema versioning beyond the
//! version gate itself.
//!
//! Uses `anyhow::Result` because storage errors are adapter-specific and
//! don't need domain-level classification.

/// Well-known keys used by the engine and the startup gate
pub mod keys {
    /// The stable per-installation device identifier
    pub const DEVICE_ID: &str = "device_id";
    /// The app version that last ran on this installation
    pub const LAST_SEEN_VERSION: &str = "last_seen_version";
}

/// Port trait for flat per-installation state
pub trait ILocalStateStore: Send + Sync {
    /// Reads a value, or `None` when the key was never written
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}
