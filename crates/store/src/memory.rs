use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use stockledger_audit::{AuditRecord, EntityKind};
use stockledger_catalog::InventoryItem;
use stockledger_core::{ExpectedVersion, ItemId, LotId};
use stockledger_ledger::{StockLot, Transaction};

use crate::repository::{CommitBatch, InventoryStore, ItemState, StoreError};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<ItemId, InventoryItem>,
    item_order: Vec<ItemId>,
    sku_index: HashMap<String, ItemId>,
    lots: HashMap<LotId, StockLot>,
    lot_order: HashMap<ItemId, Vec<LotId>>,
    /// Running on-hand total per item, updated on every lot upsert.
    stock_totals: HashMap<ItemId, f64>,
    transactions: HashMap<ItemId, Vec<Transaction>>,
    audits: Vec<AuditRecord>,
    /// Per-item stream version for optimistic concurrency.
    versions: HashMap<ItemId, u64>,
}

/// In-memory inventory store.
///
/// A single `RwLock` over the tables makes commit batches atomic and
/// reads consistent; version checks still give per-item write isolation,
/// so the behavior matches what a per-item transaction scope on a durable
/// backend would provide. Intended for tests, development, and the
/// bundled server.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl InventoryStore for InMemoryStore {
    fn insert_item(&self, item: InventoryItem, audit: AuditRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if inner.sku_index.contains_key(&item.sku) {
            return Err(StoreError::DuplicateSku(item.sku));
        }

        let id = item.id;
        inner.sku_index.insert(item.sku.clone(), id);
        inner.item_order.push(id);
        inner.items.insert(id, item);
        inner.versions.insert(id, 1);
        inner.stock_totals.insert(id, 0.0);
        inner.audits.push(audit);
        Ok(())
    }

    fn item_state(&self, id: ItemId) -> Result<Option<ItemState>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;

        let Some(item) = inner.items.get(&id) else {
            return Ok(None);
        };

        let lots = inner
            .lot_order
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|lot_id| inner.lots.get(lot_id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(ItemState {
            item: item.clone(),
            lots,
            version: *inner.versions.get(&id).unwrap_or(&0),
        }))
    }

    fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .item_order
            .iter()
            .filter_map(|id| inner.items.get(id).cloned())
            .collect())
    }

    fn lot(&self, id: LotId) -> Result<Option<StockLot>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.lots.get(&id).cloned())
    }

    fn current_stock(&self, id: ItemId) -> Result<Option<f64>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.stock_totals.get(&id).copied())
    }

    fn transactions(&self, id: ItemId) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut txns = inner.transactions.get(&id).cloned().unwrap_or_default();
        // Appends carry monotone timestamps per item, but the contract is
        // timestamp order, so sort stably regardless.
        txns.sort_by_key(|t| t.timestamp);
        Ok(txns)
    }

    fn audit_history(
        &self,
        entity: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<AuditRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut records: Vec<AuditRecord> = inner
            .audits
            .iter()
            .filter(|r| r.entity == entity && r.entity_id == entity_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    fn commit(
        &self,
        item_id: ItemId,
        expected: ExpectedVersion,
        batch: CommitBatch,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if !inner.items.contains_key(&item_id) {
            return Err(StoreError::NotFound(format!("item {item_id}")));
        }

        let current = *inner.versions.get(&item_id).unwrap_or(&0);
        if !expected.matches(current) {
            return Err(StoreError::Conflict(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        // Reject malformed batches before touching anything, so a failed
        // commit leaves no partial writes behind.
        if let Some(item) = &batch.item {
            if item.id != item_id {
                return Err(StoreError::Conflict(format!(
                    "batch item {} does not match stream {item_id}",
                    item.id
                )));
            }
        }
        for lot in &batch.lot_upserts {
            if lot.item_id != item_id {
                return Err(StoreError::Conflict(format!(
                    "batch lot {} belongs to item {}, not stream {item_id}",
                    lot.id, lot.item_id
                )));
            }
        }

        // Version checked, batch validated; everything below applies
        // together under the write lock.
        if let Some(item) = batch.item {
            inner.items.insert(item_id, item);
        }

        for lot in batch.lot_upserts {
            let lot_id = lot.id;
            let quantity = lot.quantity;
            let prior = inner.lots.insert(lot_id, lot);
            let delta = quantity - prior.map(|p| p.quantity).unwrap_or(0.0);
            *inner.stock_totals.entry(item_id).or_insert(0.0) += delta;
            let order = inner.lot_order.entry(item_id).or_default();
            if !order.contains(&lot_id) {
                order.push(lot_id);
            }
        }

        if let Some(txn) = batch.transaction {
            inner.transactions.entry(item_id).or_default().push(txn);
        }

        inner.audits.extend(batch.audits);

        let next = current + 1;
        inner.versions.insert(item_id, next);
        Ok(next)
    }
}
