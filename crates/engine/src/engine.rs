use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockledger_audit::{AuditAction, AuditRecord, AuditSnapshot, EntityKind};
use stockledger_catalog::{InventoryItem, ItemSpec, ItemUpdate};
use stockledger_core::{
    AuditId, DomainError, DomainResult, ExpectedVersion, ItemId, LocationId, LotId, TransactionId,
};
use stockledger_ledger::{plan_debits, LotDebit, LotInfo, StockLot, Transaction};
use stockledger_store::{CommitBatch, InventoryStore, ItemState, StoreError};

/// How many times a validate-then-commit sequence is replayed when another
/// writer commits to the same item first, before the conflict is surfaced.
const COMMIT_RETRY_BUDGET: u32 = 3;

/// Receive a new stock lot for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub lot: LotInfo,
    pub location_id: LocationId,
    pub unit_cost: Option<f64>,
    pub source: Option<String>,
    pub performed_by: Option<String>,
    pub reference: Option<String>,
}

/// Issue (consume) stock from an item's lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueStock {
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
    pub performed_by: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Correct one lot to a counted quantity (shrinkage, cycle count).
/// Unlike the other paths, `reason` is required: adjustments must always
/// be explained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub item_id: ItemId,
    pub lot_id: LotId,
    pub new_quantity: f64,
    pub reason: String,
    pub performed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiveOutcome {
    pub lot: StockLot,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueOutcome {
    pub debits: Vec<LotDebit>,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustOutcome {
    pub lot: StockLot,
    pub transaction: Transaction,
}

/// Low-stock report row: an active item at or below its reorder point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockItem {
    pub item: InventoryItem,
    pub on_hand: f64,
}

/// The orchestrator and sole writer of lots, transactions, and audit
/// records. Each operation is a short-lived transaction:
/// `validating → mutating → committed`, or `validating → aborted` with no
/// observable partial state.
#[derive(Debug)]
pub struct ConsistencyEngine<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> ConsistencyEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // ---- catalog operations ----

    /// Register a new catalog item. Fails with a conflict if the SKU is
    /// already registered, even by a deactivated item.
    pub fn register_item(
        &self,
        spec: ItemSpec,
        performed_by: Option<String>,
    ) -> DomainResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem::register(ItemId::new(), spec, now)?;

        let audit = AuditRecord::record(
            AuditId::new(),
            EntityKind::Item,
            item.id.into(),
            AuditAction::Create,
            None,
            Some(item_snapshot(&item)?),
            performed_by,
            None,
            now,
        );

        self.store
            .insert_item(item.clone(), audit)
            .map_err(map_store_error)?;

        tracing::info!(item_id = %item.id, sku = %item.sku, "item registered");
        Ok(item)
    }

    pub fn lookup(&self, id: ItemId) -> DomainResult<InventoryItem> {
        Ok(self.item_state(id)?.item)
    }

    /// Active items, insertion order.
    pub fn list_active(&self) -> DomainResult<Vec<InventoryItem>> {
        let items = self.store.list_items().map_err(map_store_error)?;
        Ok(items.into_iter().filter(|i| i.active).collect())
    }

    /// Update mutable catalog attributes. Identity fields (SKU, unit) are
    /// fixed at registration.
    pub fn update_item(
        &self,
        id: ItemId,
        update: ItemUpdate,
        performed_by: Option<String>,
    ) -> DomainResult<InventoryItem> {
        self.with_item_retry(id, |state| {
            let updated = state.item.apply_update(update.clone())?;
            let audit = AuditRecord::record(
                AuditId::new(),
                EntityKind::Item,
                id.into(),
                AuditAction::Update,
                Some(item_snapshot(&state.item)?),
                Some(item_snapshot(&updated)?),
                performed_by.clone(),
                None,
                Utc::now(),
            );
            let batch = CommitBatch {
                item: Some(updated.clone()),
                audits: vec![audit],
                ..CommitBatch::default()
            };
            Ok((batch, updated))
        })
    }

    /// Deactivate an item. The item and its history remain; only new
    /// receipts and issues are blocked.
    pub fn deactivate_item(
        &self,
        id: ItemId,
        reason: String,
        performed_by: Option<String>,
    ) -> DomainResult<()> {
        self.with_item_retry(id, |state| {
            let deactivated = state.item.deactivate()?;
            let audit = AuditRecord::record(
                AuditId::new(),
                EntityKind::Item,
                id.into(),
                AuditAction::Deactivate,
                Some(item_snapshot(&state.item)?),
                Some(item_snapshot(&deactivated)?),
                performed_by.clone(),
                Some(reason.clone()),
                Utc::now(),
            );
            let batch = CommitBatch {
                item: Some(deactivated),
                audits: vec![audit],
                ..CommitBatch::default()
            };
            Ok((batch, ()))
        })
    }

    // ---- stock operations ----

    /// Receive stock: create the lot, append the receipt transaction,
    /// record the audit, atomically.
    pub fn receive_stock(&self, req: ReceiveStock) -> DomainResult<ReceiveOutcome> {
        let outcome = self.with_item_retry(req.item_id, |state| {
            let now = Utc::now();
            let lot = StockLot::receive(
                LotId::new(),
                &state.item,
                req.quantity,
                &req.unit,
                req.lot.clone(),
                req.location_id,
                req.unit_cost,
                req.source.clone(),
                now,
            )?;

            let transaction = Transaction::receipt(
                TransactionId::new(),
                req.item_id,
                req.quantity,
                &req.unit,
                req.performed_by.clone(),
                req.reference.clone(),
                now,
            );

            let audit = AuditRecord::record(
                AuditId::new(),
                EntityKind::StockLot,
                lot.id.into(),
                AuditAction::Create,
                None,
                Some(lot_snapshot(&lot)?),
                req.performed_by.clone(),
                None,
                now,
            );

            let batch = CommitBatch {
                lot_upserts: vec![lot.clone()],
                transaction: Some(transaction.clone()),
                audits: vec![audit],
                ..CommitBatch::default()
            };
            Ok((batch, ReceiveOutcome { lot, transaction }))
        })?;

        tracing::debug!(
            item_id = %req.item_id,
            lot_id = %outcome.lot.id,
            quantity = req.quantity,
            "stock received"
        );
        Ok(outcome)
    }

    /// Issue stock, drawing down lots FEFO-first. Fails atomically with
    /// `InsufficientStock` when the item cannot cover the quantity.
    pub fn issue_stock(&self, req: IssueStock) -> DomainResult<IssueOutcome> {
        let outcome = self.with_item_retry(req.item_id, |state| {
            if !state.item.active {
                return Err(DomainError::validation(format!(
                    "item {} is inactive",
                    state.item.sku
                )));
            }
            if req.unit != state.item.unit {
                return Err(DomainError::validation(format!(
                    "unit mismatch: issue unit '{}' does not match item unit '{}'",
                    req.unit, state.item.unit
                )));
            }

            let plan = plan_debits(&state.lots, req.quantity)?;
            let now = Utc::now();

            let transaction = Transaction::issue(
                TransactionId::new(),
                req.item_id,
                req.quantity,
                &req.unit,
                req.performed_by.clone(),
                req.reference.clone(),
                req.note.clone(),
                now,
            );

            // One audit record per affected lot, pre/post quantities.
            let mut audits = Vec::with_capacity(plan.debits.len());
            for (debit, updated) in plan.debits.iter().zip(plan.updated_lots.iter()) {
                let before = state
                    .lots
                    .iter()
                    .find(|l| l.id == debit.lot_id)
                    .ok_or_else(|| DomainError::storage("debited lot missing from snapshot"))?;
                audits.push(AuditRecord::record(
                    AuditId::new(),
                    EntityKind::StockLot,
                    debit.lot_id.into(),
                    AuditAction::Adjust,
                    Some(lot_snapshot(before)?),
                    Some(lot_snapshot(updated)?),
                    req.performed_by.clone(),
                    None,
                    now,
                ));
            }

            let batch = CommitBatch {
                lot_upserts: plan.updated_lots,
                transaction: Some(transaction.clone()),
                audits,
                ..CommitBatch::default()
            };
            Ok((
                batch,
                IssueOutcome {
                    debits: plan.debits,
                    transaction,
                },
            ))
        })?;

        tracing::debug!(
            item_id = %req.item_id,
            quantity = req.quantity,
            lots = outcome.debits.len(),
            "stock issued"
        );
        Ok(outcome)
    }

    /// Correct one lot to a counted quantity. The delta is logged as an
    /// adjustment transaction so the ledger identity keeps holding.
    pub fn adjust_stock(&self, req: AdjustStock) -> DomainResult<AdjustOutcome> {
        if req.reason.trim().is_empty() {
            return Err(DomainError::validation(
                "reason is required for adjustments",
            ));
        }

        self.with_item_retry(req.item_id, |state| {
            let before = state
                .lots
                .iter()
                .find(|l| l.id == req.lot_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "lot {} for item {}",
                        req.lot_id, req.item_id
                    ))
                })?;

            let updated = before.with_quantity(req.new_quantity)?;
            let delta = updated.quantity - before.quantity;
            if delta == 0.0 {
                return Err(DomainError::validation(
                    "adjustment must change the quantity",
                ));
            }

            let now = Utc::now();
            let transaction = Transaction::adjustment(
                TransactionId::new(),
                req.item_id,
                delta,
                &before.unit,
                req.performed_by.clone(),
                Some(req.reason.clone()),
                now,
            );

            let audit = AuditRecord::record(
                AuditId::new(),
                EntityKind::StockLot,
                req.lot_id.into(),
                AuditAction::Adjust,
                Some(lot_snapshot(before)?),
                Some(lot_snapshot(&updated)?),
                req.performed_by.clone(),
                Some(req.reason.clone()),
                now,
            );

            let batch = CommitBatch {
                lot_upserts: vec![updated.clone()],
                transaction: Some(transaction.clone()),
                audits: vec![audit],
                ..CommitBatch::default()
            };
            Ok((
                batch,
                AdjustOutcome {
                    lot: updated,
                    transaction,
                },
            ))
        })
    }

    // ---- reads (latest committed state, non-blocking) ----

    pub fn current_stock(&self, id: ItemId) -> DomainResult<f64> {
        self.store
            .current_stock(id)
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    pub fn lots(&self, id: ItemId) -> DomainResult<Vec<StockLot>> {
        Ok(self.item_state(id)?.lots)
    }

    /// Transaction history, timestamp ascending.
    pub fn transaction_history(&self, id: ItemId) -> DomainResult<Vec<Transaction>> {
        self.item_state(id)?;
        self.store.transactions(id).map_err(map_store_error)
    }

    /// Audit history for one entity, timestamp ascending.
    pub fn audit_history(
        &self,
        entity: EntityKind,
        entity_id: Uuid,
    ) -> DomainResult<Vec<AuditRecord>> {
        self.store
            .audit_history(entity, entity_id)
            .map_err(map_store_error)
    }

    /// Active items at or below their reorder point. Reporting only;
    /// nothing is ordered automatically. Items with a zero reorder point
    /// are excluded, they opted out of the report.
    pub fn low_stock(&self) -> DomainResult<Vec<LowStockItem>> {
        let mut report = Vec::new();
        for item in self.list_active()? {
            if item.reorder_point <= 0.0 {
                continue;
            }
            let on_hand = self.current_stock(item.id)?;
            if on_hand <= item.reorder_point {
                report.push(LowStockItem { item, on_hand });
            }
        }
        Ok(report)
    }

    // ---- internals ----

    fn item_state(&self, id: ItemId) -> DomainResult<ItemState> {
        self.store
            .item_state(id)
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    /// Replay the validate-then-commit sequence against fresh snapshots
    /// until it commits, a domain error aborts it, or the retry budget is
    /// exhausted. Validation failures are terminal: a stale snapshot never
    /// causes them, re-validation happens on the fresh snapshot each lap.
    fn with_item_retry<T>(
        &self,
        item_id: ItemId,
        mut attempt: impl FnMut(&ItemState) -> DomainResult<(CommitBatch, T)>,
    ) -> DomainResult<T> {
        let mut last_conflict = String::new();

        for lap in 0..COMMIT_RETRY_BUDGET {
            let state = self.item_state(item_id)?;
            let (batch, result) = attempt(&state)?;

            match self
                .store
                .commit(item_id, ExpectedVersion::Exact(state.version), batch)
            {
                Ok(_) => return Ok(result),
                Err(StoreError::Conflict(msg)) => {
                    tracing::warn!(item_id = %item_id, lap, "commit conflict, retrying");
                    last_conflict = msg;
                }
                Err(e) => return Err(map_store_error(e)),
            }
        }

        Err(DomainError::conflict(format!(
            "concurrent modification of item {item_id} exceeded retry budget: {last_conflict}"
        )))
    }
}

fn map_store_error(err: StoreError) -> DomainError {
    match err {
        StoreError::Conflict(msg) => DomainError::conflict(msg),
        StoreError::DuplicateSku(sku) => {
            DomainError::conflict(format!("sku '{sku}' is already registered"))
        }
        StoreError::NotFound(msg) => DomainError::not_found(msg),
        StoreError::Unavailable(msg) => DomainError::storage(msg),
    }
}

fn item_snapshot(item: &InventoryItem) -> DomainResult<AuditSnapshot> {
    let value = serde_json::to_value(item)
        .map_err(|e| DomainError::storage(format!("item snapshot serialization failed: {e}")))?;
    Ok(AuditSnapshot::Item(value))
}

fn lot_snapshot(lot: &StockLot) -> DomainResult<AuditSnapshot> {
    let value = serde_json::to_value(lot)
        .map_err(|e| DomainError::storage(format!("lot snapshot serialization failed: {e}")))?;
    Ok(AuditSnapshot::StockLot(value))
}
