use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use stockledger_audit::{AuditRecord, EntityKind};
use stockledger_catalog::InventoryItem;
use stockledger_core::{ExpectedVersion, ItemId, LotId};
use stockledger_ledger::{StockLot, Transaction};

/// Store operation error.
///
/// Infrastructure-level failures, distinct from domain errors. The engine
/// maps these onto the domain taxonomy at its boundary (`Conflict` feeds
/// the bounded retry loop, `Unavailable` surfaces as a storage failure).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed: another writer committed to
    /// this item's stream first.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    /// SKU already registered (active or inactive).
    #[error("duplicate sku: {0}")]
    DuplicateSku(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store is unreachable or internally broken.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Consistent point-in-time view of one item's stream: the item row, its
/// lots in receipt order, and the stream version the snapshot was taken
/// at. Mutations validate against this and commit with
/// `ExpectedVersion::Exact(version)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemState {
    pub item: InventoryItem,
    pub lots: Vec<StockLot>,
    pub version: u64,
}

/// One atomic unit of writes against a single item's stream.
///
/// Everything in a batch becomes durable together or not at all: an
/// external reader never sees a transaction without its lot mutations and
/// audit records.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// Updated item row (attribute update or deactivation).
    pub item: Option<InventoryItem>,
    /// Lot inserts and quantity updates, keyed by lot id.
    pub lot_upserts: Vec<StockLot>,
    /// The movement this batch records, if quantity changed.
    pub transaction: Option<Transaction>,
    /// One record per mutated entity.
    pub audits: Vec<AuditRecord>,
}

/// Durable store backing the four logical tables: `inventory_items`,
/// `stock_lots`, `transactions`, `audit_records`.
///
/// Reads return the latest committed state and never observe a partial
/// commit. Writes are scoped to one item stream and version-checked, which
/// gives per-item mutual exclusion without a global lock.
pub trait InventoryStore: Send + Sync {
    /// Insert a newly registered item together with its creation audit
    /// record. Fails with `DuplicateSku` if the SKU is taken by any item,
    /// active or not.
    fn insert_item(&self, item: InventoryItem, audit: AuditRecord) -> Result<(), StoreError>;

    /// Snapshot one item's stream. `None` if the item does not exist.
    fn item_state(&self, id: ItemId) -> Result<Option<ItemState>, StoreError>;

    /// All items in insertion order.
    fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError>;

    fn lot(&self, id: LotId) -> Result<Option<StockLot>, StoreError>;

    /// Running on-hand total for the item, maintained incrementally on
    /// commit so reads are O(1). `None` if the item does not exist.
    fn current_stock(&self, id: ItemId) -> Result<Option<f64>, StoreError>;

    /// Transaction history for an item, timestamp ascending.
    fn transactions(&self, id: ItemId) -> Result<Vec<Transaction>, StoreError>;

    /// Audit history for one entity, timestamp ascending.
    fn audit_history(
        &self,
        entity: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<AuditRecord>, StoreError>;

    /// Apply a batch atomically against the item's stream, checking the
    /// expected version first. Returns the new stream version.
    fn commit(
        &self,
        item_id: ItemId,
        expected: ExpectedVersion,
        batch: CommitBatch,
    ) -> Result<u64, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn insert_item(&self, item: InventoryItem, audit: AuditRecord) -> Result<(), StoreError> {
        (**self).insert_item(item, audit)
    }

    fn item_state(&self, id: ItemId) -> Result<Option<ItemState>, StoreError> {
        (**self).item_state(id)
    }

    fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        (**self).list_items()
    }

    fn lot(&self, id: LotId) -> Result<Option<StockLot>, StoreError> {
        (**self).lot(id)
    }

    fn current_stock(&self, id: ItemId) -> Result<Option<f64>, StoreError> {
        (**self).current_stock(id)
    }

    fn transactions(&self, id: ItemId) -> Result<Vec<Transaction>, StoreError> {
        (**self).transactions(id)
    }

    fn audit_history(
        &self,
        entity: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<AuditRecord>, StoreError> {
        (**self).audit_history(entity, entity_id)
    }

    fn commit(
        &self,
        item_id: ItemId,
        expected: ExpectedVersion,
        batch: CommitBatch,
    ) -> Result<u64, StoreError> {
        (**self).commit(item_id, expected, batch)
    }
}
