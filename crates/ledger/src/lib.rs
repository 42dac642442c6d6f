//! Lot ledger domain module.
//!
//! Owns `StockLot` records (physical batches with optional expiry), the
//! FEFO/FIFO debit planner, and the append-only `Transaction` type. Pure
//! domain logic: operations validate and return state transitions by
//! value; feasibility-checked commits are sequenced by the engine.

pub mod debit;
pub mod lot;
pub mod transaction;

pub use debit::{plan_debits, DebitPlan, LotDebit};
pub use lot::{LotInfo, StockLot};
pub use transaction::{Transaction, TransactionKind};
