//! Consistency engine: the orchestrator callers invoke.
//!
//! Sequences multi-entity mutations so the lot ledger, the transaction
//! log, and the audit trail move together or not at all. Feasibility is
//! checked against a versioned snapshot of the item's stream; the commit
//! is retried a bounded number of times on concurrent modification.

mod engine;

#[cfg(test)]
mod tests;

pub use engine::{
    AdjustOutcome, AdjustStock, ConsistencyEngine, IssueOutcome, IssueStock, LowStockItem,
    ReceiveOutcome, ReceiveStock,
};
