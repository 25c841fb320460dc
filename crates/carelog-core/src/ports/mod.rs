//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - The backend record store (authentication, record
//!   load/save with dedup/merge)
//! - [`ICredentialStore`] - Durable storage for the session credentials
//! - [`ILocalStateStore`] - Durable key→string storage for installation
//!   state (device id, last-seen app version)

pub mod credential_store;
pub mod remote_store;
pub mod state_store;

pub use credential_store::ICredentialStore;
pub use remote_store::{IRemoteStore, RemoteError};
pub use state_store::{keys, ILocalStateStore};
