//! Core functionality for the guardrail project
//!
//! This crate contains the domain types and the protection service for the
//! guardrail brute force protection ecosystem: escalating, TTL-backed
//! lockouts for repeated failed attempts against a sensitive operation,
//! tracked per `(identifier, action)` pair.
//!
//! See [`BruteForceProtectionService`] for the service,
//! [`AttemptStore`] for the storage seam, and [`LockoutConfig`] for the
//! configuration presets. Storage backends live in their own crates; this
//! crate ships [`MemoryStore`], a TTL-aware in-memory implementation used by
//! tests and single-process deployments.

pub mod backoff;
pub mod config;
pub mod error;
pub mod keys;
pub mod services;
pub mod status;
pub mod store;

pub use config::LockoutConfig;
pub use error::{Error, ProtectError, StoreError, ValidationError};
pub use keys::AttemptKeys;
pub use services::BruteForceProtectionService;
pub use status::{DetailedStatus, LockoutRecord, LockoutStatus};
pub use store::{AttemptStore, MemoryStore};
