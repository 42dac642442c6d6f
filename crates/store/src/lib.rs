//! Persistence seam for the inventory ledger.
//!
//! The engine talks to a durable key-indexed store through the
//! [`InventoryStore`] trait: snapshot reads plus atomic, version-checked
//! commit batches. The in-memory implementation backs tests, development,
//! and the bundled HTTP server; a SQL/KV backend would implement the same
//! trait with a per-item transaction scope.

pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::{CommitBatch, InventoryStore, ItemState, StoreError};
