//! Domain error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type DomainResult<T> = Result<T, DomainError>;

/// Error taxonomy for every ledger operation.
///
/// Each operation either commits fully and returns a success value, or
/// returns one of these with no partial side effect. Callers map each kind
/// to a distinct response; a `Storage` failure must never be reported as a
/// `Validation` failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Caller mistake: bad quantity, missing required field, expiry before
    /// manufacture, unit mismatch. Not retriable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Referenced item or lot does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate SKU, or a concurrent modification that exhausted the
    /// commit retry budget. The caller decides whether to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An issue was requested against less stock than is on hand.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: f64, available: f64 },

    /// The persistence layer failed. Always surfaced, never swallowed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
