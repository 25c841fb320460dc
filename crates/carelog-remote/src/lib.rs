//! CareLog Remote - Backend REST adapter
//!
//! Provides the async client for the backend's record store:
//! - Uniform request wrapper with app-key headers and error classification
//! - Account authentication (signup, login, session validation)
//! - The dedup/merge record save path
//! - Keyring-backed credential storage and file-backed installation state
//!
//! ## Modules
//!
//! - [`client`] - HTTP client over the backend REST surface
//! - [`records`] - `IRemoteStore` implementation with dedup/merge
//! - [`identity`] - Credential and installation-state storage adapters

pub mod client;
pub mod identity;
pub mod records;

pub use client::RestClient;
pub use identity::{FileStateStore, KeyringCredentialStore};
pub use records::RestRemoteStore;
