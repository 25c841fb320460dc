//! CareLog Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Member`, `MemberDataset`, `RemoteRecord`, `RecordPatch`,
//!   `Session`, `LocalStore`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ICredentialStore`,
//!   `ILocalStateStore`
//! - **Version gating** - Ordered application versions for stale-session invalidation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement.
//! The sync engine (carelog-sync) orchestrates domain entities through port
//! interfaces.

pub mod config;
pub mod domain;
pub mod ports;
