use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Action must not be empty")]
    EmptyAction,
}

/// Failures of the attempt store itself.
///
/// These are never swallowed: a service that cannot confirm "not blocked"
/// does not proceed as if it were.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error for key {key}: {message}")]
    Serialization { key: String, message: String },
}

/// Error surface of [`protect`](crate::BruteForceProtectionService::protect).
///
/// The protected operation's own error is kept intact as the `source` of
/// [`ProtectError::Operation`]; only the rendered message gains the
/// remaining-attempts hint, so callers can still match on the original
/// failure.
#[derive(Debug, Error)]
pub enum ProtectError<E>
where
    E: std::error::Error + 'static,
{
    /// The identifier and action are serving an active lockout. The protected
    /// operation was not invoked.
    #[error("too many failed attempts, try again in {retry_after_seconds} seconds")]
    Blocked {
        blocked_until: DateTime<Utc>,
        retry_after_seconds: i64,
    },

    /// The protection machinery failed before the operation could be guarded.
    #[error(transparent)]
    Protection(#[from] Error),

    /// The protected operation ran and failed.
    #[error("{}", operation_message(.source, .remaining_attempts))]
    Operation {
        #[source]
        source: E,
        /// Attempts left before the next failure locks the key, when any.
        remaining_attempts: Option<u32>,
    },
}

fn operation_message(source: &impl fmt::Display, remaining: &Option<u32>) -> String {
    match remaining {
        Some(1) => format!("{source}; 1 attempt remaining"),
        Some(n) => format!("{source}; {n} attempts remaining"),
        None => source.to_string(),
    }
}
