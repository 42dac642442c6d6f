//! Audit trail domain module.
//!
//! Append-only before/after snapshots of every state change, independent
//! of the transaction log. The trail does not interpret snapshot contents;
//! heterogeneity across entity shapes is carried by a tagged variant that
//! readers of the history resolve.

pub mod record;

pub use record::{AuditAction, AuditRecord, AuditSnapshot, EntityKind};
