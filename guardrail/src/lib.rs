//! Guardrail: escalating brute force protection for sensitive operations.
//!
//! Guardrail throttles repeated failed attempts against a sensitive
//! operation (validating a security code, redeeming a token) per
//! `(identifier, action)` pair, backed by any TTL-capable key-value store.
//! Failed attempts accumulate inside a sliding window; once the limit is
//! reached the pair is locked out, and consecutive lockouts grow
//! exponentially up to a ceiling.
//!
//! The attempt is recorded *before* the protected operation runs, so a
//! caller can never distinguish "operation ran and failed" from "operation
//! was skipped due to lockout" — the channel an attacker would otherwise use
//! to probe whether guesses are being counted.
//!
//! # Example
//!
//! ```rust
//! use guardrail::{Guardrail, LockoutConfig};
//!
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("invalid security code")]
//! # struct InvalidCode;
//! # async fn validate_code(_code: &str) -> Result<(), InvalidCode> { Ok(()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let guard = Guardrail::in_memory(LockoutConfig::strict());
//!
//! let result = guard
//!     .protect("company-42", "security_code_validation", || async {
//!         validate_code("1234").await
//!     })
//!     .await;
//! # result.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```
//!
//! For multi-instance deployments enable the `redis` feature and build with
//! [`RedisAttemptStore`] so every instance shares one set of counters.

mod builder;

pub use builder::{Guardrail, GuardrailBuilder, GuardrailBuilderError};

pub use guardrail_core::{
    AttemptKeys, AttemptStore, BruteForceProtectionService, DetailedStatus, Error, LockoutConfig,
    LockoutRecord, LockoutStatus, MemoryStore, ProtectError, StoreError, ValidationError,
};

#[cfg(feature = "redis")]
pub use guardrail_store_redis::RedisAttemptStore;
