//! `stockledger-core` — shared domain primitives.
//!
//! Typed identifiers, the domain error taxonomy, and the optimistic
//! versioning primitive used by the store. Pure domain code: no IO.

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{AuditId, ItemId, LocationId, LotId, TransactionId};
pub use version::ExpectedVersion;
