//! Optimistic concurrency primitive for per-item streams.

use crate::error::{DomainError, DomainResult};

/// Version expectation checked by the store at commit time.
///
/// Every item has a monotonically increasing stream version. Mutations are
/// validated against a snapshot taken at that version; the commit is
/// rejected if another writer got there first, which is how per-item
/// mutual exclusion is enforced without a global lock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (reads, idempotent maintenance).
    Any,
    /// Require the item stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
