use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use stockledger_audit::{AuditAction, AuditRecord, EntityKind};
use stockledger_catalog::{InventoryItem, ItemSpec, ItemUpdate};
use stockledger_core::{DomainError, ExpectedVersion, ItemId, LocationId, LotId};
use stockledger_ledger::{LotInfo, TransactionKind};
use stockledger_store::{CommitBatch, InMemoryStore, InventoryStore, StoreError};

use crate::{AdjustStock, ConsistencyEngine, IssueStock, ReceiveStock};

fn engine() -> ConsistencyEngine<InMemoryStore> {
    ConsistencyEngine::new(InMemoryStore::new())
}

fn spec(sku: &str, unit: &str, reorder_point: f64) -> ItemSpec {
    ItemSpec {
        sku: sku.to_string(),
        name: format!("{sku} item"),
        description: None,
        unit: unit.to_string(),
        reorder_point,
        lead_time_days: 7,
        industry_id: None,
    }
}

fn receive(
    item: &InventoryItem,
    quantity: f64,
    lot_code: Option<&str>,
    expiry: Option<chrono::DateTime<Utc>>,
) -> ReceiveStock {
    ReceiveStock {
        item_id: item.id,
        quantity,
        unit: item.unit.clone(),
        lot: LotInfo {
            lot_code: lot_code.map(str::to_string),
            manufacture_date: None,
            expiry_date: expiry,
        },
        location_id: LocationId::new(),
        unit_cost: None,
        source: None,
        performed_by: Some("tester".to_string()),
        reference: None,
    }
}

fn issue(item: &InventoryItem, quantity: f64) -> IssueStock {
    IssueStock {
        item_id: item.id,
        quantity,
        unit: item.unit.clone(),
        performed_by: Some("tester".to_string()),
        reference: None,
        note: None,
    }
}

fn signed_sum<S: InventoryStore>(engine: &ConsistencyEngine<S>, id: ItemId) -> f64 {
    engine
        .transaction_history(id)
        .unwrap()
        .iter()
        .map(|t| t.quantity)
        .sum()
}

fn lot_sum<S: InventoryStore>(engine: &ConsistencyEngine<S>, id: ItemId) -> f64 {
    engine.lots(id).unwrap().iter().map(|l| l.quantity).sum()
}

// ---- the concrete end-to-end scenario ----

#[test]
fn widget_scenario_holds_the_ledger_identity() {
    let engine = engine();
    let item = engine
        .register_item(spec("WIDGET-1", "ea", 10.0), None)
        .unwrap();

    let l1 = engine
        .receive_stock(receive(&item, 100.0, Some("L1"), None))
        .unwrap();
    let expiry = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let l2 = engine
        .receive_stock(receive(&item, 50.0, Some("L2"), Some(expiry)))
        .unwrap();

    let outcome = engine.issue_stock(issue(&item, 120.0)).unwrap();

    // L1 is undated and received first, so it drains fully before L2.
    assert_eq!(outcome.debits.len(), 2);
    assert_eq!(outcome.debits[0].lot_id, l1.lot.id);
    assert_eq!(outcome.debits[0].quantity_taken, 100.0);
    assert_eq!(outcome.debits[1].lot_id, l2.lot.id);
    assert_eq!(outcome.debits[1].quantity_taken, 20.0);

    let lots = engine.lots(item.id).unwrap();
    let l1_now = lots.iter().find(|l| l.id == l1.lot.id).unwrap();
    let l2_now = lots.iter().find(|l| l.id == l2.lot.id).unwrap();
    assert_eq!(l1_now.quantity, 0.0);
    assert_eq!(l2_now.quantity, 30.0);

    assert_eq!(engine.current_stock(item.id).unwrap(), 30.0);

    let history = engine.transaction_history(item.id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(signed_sum(&engine, item.id), 30.0);
}

// ---- catalog ----

#[test]
fn duplicate_sku_conflicts_even_after_deactivation() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();

    let err = engine
        .register_item(spec("SKU-1", "ea", 0.0), None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    engine
        .deactivate_item(item.id, "obsolete".to_string(), None)
        .unwrap();
    let err = engine
        .register_item(spec("SKU-1", "ea", 0.0), None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[test]
fn lookup_unknown_item_is_not_found() {
    let engine = engine();
    let err = engine.lookup(ItemId::new()).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn list_active_excludes_deactivated_items_in_insertion_order() {
    let engine = engine();
    let a = engine.register_item(spec("A", "ea", 0.0), None).unwrap();
    let b = engine.register_item(spec("B", "ea", 0.0), None).unwrap();
    let c = engine.register_item(spec("C", "ea", 0.0), None).unwrap();

    engine
        .deactivate_item(b.id, "discontinued".to_string(), None)
        .unwrap();

    let active: Vec<ItemId> = engine.list_active().unwrap().iter().map(|i| i.id).collect();
    assert_eq!(active, vec![a.id, c.id]);
}

#[test]
fn update_item_is_audited_with_before_and_after() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 5.0), None).unwrap();

    let updated = engine
        .update_item(
            item.id,
            ItemUpdate {
                reorder_point: Some(12.0),
                ..ItemUpdate::default()
            },
            Some("admin".to_string()),
        )
        .unwrap();
    assert_eq!(updated.reorder_point, 12.0);

    let history = engine
        .audit_history(EntityKind::Item, item.id.into())
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, AuditAction::Create);
    assert_eq!(history[1].action, AuditAction::Update);
    assert!(history[1].before.is_some());
    assert!(history[1].after.is_some());
}

#[test]
fn deactivated_item_rejects_receive_and_issue() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap();
    engine
        .deactivate_item(item.id, "damaged line".to_string(), None)
        .unwrap();

    let err = engine
        .receive_stock(receive(&item, 5.0, None, None))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = engine.issue_stock(issue(&item, 5.0)).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

// ---- stock movements ----

#[test]
fn receive_rejects_non_positive_quantity() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let err = engine
        .receive_stock(receive(&item, 0.0, None, None))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn issue_rejects_unit_mismatch() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "kg", 0.0), None).unwrap();
    engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap();

    let mut req = issue(&item, 1.0);
    req.unit = "g".to_string();
    let err = engine.issue_stock(req).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn fefo_prefers_the_earlier_expiry() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();

    let late = engine
        .receive_stock(receive(
            &item,
            5.0,
            Some("B"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        ))
        .unwrap();
    let early = engine
        .receive_stock(receive(
            &item,
            5.0,
            Some("A"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ))
        .unwrap();

    let outcome = engine.issue_stock(issue(&item, 7.0)).unwrap();
    assert_eq!(outcome.debits[0].lot_id, early.lot.id);
    assert_eq!(outcome.debits[0].quantity_taken, 5.0);
    assert_eq!(outcome.debits[1].lot_id, late.lot.id);
    assert_eq!(outcome.debits[1].quantity_taken, 2.0);
}

#[test]
fn failed_issue_persists_nothing() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let lot = engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap()
        .lot;

    let txns_before = engine.transaction_history(item.id).unwrap();
    let lots_before = engine.lots(item.id).unwrap();
    let item_audit_before = engine
        .audit_history(EntityKind::Item, item.id.into())
        .unwrap();
    let lot_audit_before = engine
        .audit_history(EntityKind::StockLot, lot.id.into())
        .unwrap();

    let err = engine.issue_stock(issue(&item, 11.0)).unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock { .. }));

    assert_eq!(engine.transaction_history(item.id).unwrap(), txns_before);
    assert_eq!(engine.lots(item.id).unwrap(), lots_before);
    assert_eq!(
        engine
            .audit_history(EntityKind::Item, item.id.into())
            .unwrap(),
        item_audit_before
    );
    assert_eq!(
        engine
            .audit_history(EntityKind::StockLot, lot.id.into())
            .unwrap(),
        lot_audit_before
    );
    assert_eq!(engine.current_stock(item.id).unwrap(), 10.0);
}

#[test]
fn adjustment_requires_a_reason() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let lot = engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap()
        .lot;

    let err = engine
        .adjust_stock(AdjustStock {
            item_id: item.id,
            lot_id: lot.id,
            new_quantity: 8.0,
            reason: "  ".to_string(),
            performed_by: None,
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn adjustment_logs_the_signed_delta() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let lot = engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap()
        .lot;

    let outcome = engine
        .adjust_stock(AdjustStock {
            item_id: item.id,
            lot_id: lot.id,
            new_quantity: 7.0,
            reason: "cycle count".to_string(),
            performed_by: Some("counter".to_string()),
        })
        .unwrap();

    assert_eq!(outcome.lot.quantity, 7.0);
    assert_eq!(outcome.transaction.kind, TransactionKind::Adjustment);
    assert_eq!(outcome.transaction.quantity, -3.0);
    assert_eq!(engine.current_stock(item.id).unwrap(), 7.0);
    assert_eq!(signed_sum(&engine, item.id), 7.0);
}

#[test]
fn adjusting_an_unknown_lot_is_not_found() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let err = engine
        .adjust_stock(AdjustStock {
            item_id: item.id,
            lot_id: LotId::new(),
            new_quantity: 1.0,
            reason: "count".to_string(),
            performed_by: None,
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn zero_quantity_lot_survives_as_history() {
    let engine = engine();
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    let lot = engine
        .receive_stock(receive(&item, 5.0, None, None))
        .unwrap()
        .lot;
    engine.issue_stock(issue(&item, 5.0)).unwrap();

    let lots = engine.lots(item.id).unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].id, lot.id);
    assert_eq!(lots[0].quantity, 0.0);
}

// ---- audit completeness ----

#[test]
fn every_mutation_appends_exactly_one_record_per_entity() {
    let engine = engine();
    let item = engine
        .register_item(spec("SKU-1", "ea", 0.0), Some("admin".to_string()))
        .unwrap();

    let r1 = engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap();
    let r2 = engine
        .receive_stock(receive(&item, 10.0, None, None))
        .unwrap();

    // Issue spanning both lots: one adjust record per lot.
    engine.issue_stock(issue(&item, 15.0)).unwrap();

    let lot1_history = engine
        .audit_history(EntityKind::StockLot, r1.lot.id.into())
        .unwrap();
    assert_eq!(lot1_history.len(), 2);
    assert_eq!(lot1_history[0].action, AuditAction::Create);
    assert!(lot1_history[0].before.is_none());
    assert_eq!(lot1_history[1].action, AuditAction::Adjust);

    let lot2_history = engine
        .audit_history(EntityKind::StockLot, r2.lot.id.into())
        .unwrap();
    assert_eq!(lot2_history.len(), 2);

    engine
        .deactivate_item(item.id, "done".to_string(), Some("admin".to_string()))
        .unwrap();
    let item_history = engine
        .audit_history(EntityKind::Item, item.id.into())
        .unwrap();
    assert_eq!(item_history.len(), 2);
    assert_eq!(item_history[1].action, AuditAction::Deactivate);
    assert_eq!(item_history[1].reason.as_deref(), Some("done"));

    // Pre/post snapshots carry the exact active flag flip.
    let before = serde_json::to_value(item_history[1].before.as_ref().unwrap()).unwrap();
    let after = serde_json::to_value(item_history[1].after.as_ref().unwrap()).unwrap();
    assert_eq!(before["state"]["active"], true);
    assert_eq!(after["state"]["active"], false);
}

// ---- low stock report ----

#[test]
fn low_stock_reports_items_at_or_below_reorder_point() {
    let engine = engine();
    let low = engine.register_item(spec("LOW", "ea", 10.0), None).unwrap();
    let ok = engine.register_item(spec("OK", "ea", 10.0), None).unwrap();
    let opted_out = engine.register_item(spec("NONE", "ea", 0.0), None).unwrap();

    engine.receive_stock(receive(&low, 10.0, None, None)).unwrap();
    engine.receive_stock(receive(&ok, 50.0, None, None)).unwrap();
    engine
        .receive_stock(receive(&opted_out, 1.0, None, None))
        .unwrap();

    let report = engine.low_stock().unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].item.id, low.id);
    assert_eq!(report[0].on_hand, 10.0);
}

// ---- concurrency ----

#[test]
fn concurrent_issues_never_overdraw_one_item() {
    let engine = Arc::new(engine());
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();
    for _ in 0..4 {
        engine
            .receive_stock(receive(&item, 25.0, None, None))
            .unwrap();
    }
    assert_eq!(engine.current_stock(item.id).unwrap(), 100.0);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let item = item.clone();
        handles.push(std::thread::spawn(move || {
            let mut issued = 0.0;
            for _ in 0..4 {
                if engine.issue_stock(issue(&item, 10.0)).is_ok() {
                    issued += 10.0;
                }
            }
            issued
        }));
    }

    let issued: f64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(issued <= 100.0);

    let lots = engine.lots(item.id).unwrap();
    assert!(lots.iter().all(|l| l.quantity >= 0.0));
    assert_eq!(engine.current_stock(item.id).unwrap(), 100.0 - issued);
    assert_eq!(signed_sum(&engine, item.id), 100.0 - issued);
    assert_eq!(lot_sum(&engine, item.id), 100.0 - issued);
}

// ---- bounded retry ----

/// Store whose commits always lose the optimistic concurrency race.
struct ContestedStore {
    inner: InMemoryStore,
}

impl InventoryStore for ContestedStore {
    fn insert_item(
        &self,
        item: InventoryItem,
        audit: AuditRecord,
    ) -> Result<(), StoreError> {
        self.inner.insert_item(item, audit)
    }

    fn item_state(
        &self,
        id: ItemId,
    ) -> Result<Option<stockledger_store::ItemState>, StoreError> {
        self.inner.item_state(id)
    }

    fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.inner.list_items()
    }

    fn lot(&self, id: LotId) -> Result<Option<stockledger_ledger::StockLot>, StoreError> {
        self.inner.lot(id)
    }

    fn current_stock(&self, id: ItemId) -> Result<Option<f64>, StoreError> {
        self.inner.current_stock(id)
    }

    fn transactions(
        &self,
        id: ItemId,
    ) -> Result<Vec<stockledger_ledger::Transaction>, StoreError> {
        self.inner.transactions(id)
    }

    fn audit_history(
        &self,
        entity: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<AuditRecord>, StoreError> {
        self.inner.audit_history(entity, entity_id)
    }

    fn commit(
        &self,
        _item_id: ItemId,
        _expected: ExpectedVersion,
        _batch: CommitBatch,
    ) -> Result<u64, StoreError> {
        Err(StoreError::Conflict("always contested".to_string()))
    }
}

#[test]
fn retry_budget_exhaustion_surfaces_a_conflict() {
    let engine = ConsistencyEngine::new(ContestedStore {
        inner: InMemoryStore::new(),
    });
    let item = engine.register_item(spec("SKU-1", "ea", 0.0), None).unwrap();

    let err = engine
        .receive_stock(receive(&item, 5.0, None, None))
        .unwrap_err();
    match err {
        DomainError::Conflict(msg) => assert!(msg.contains("retry budget")),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

// ---- property: the ledger identity under random operation sequences ----

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Receive(u32),
        Issue(u32),
        AdjustFirstLot(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..500).prop_map(Op::Receive),
            (1u32..500).prop_map(Op::Issue),
            (0u32..500).prop_map(Op::AdjustFirstLot),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: whatever committed, the signed transaction sum equals
        /// both the running total and the summed lot quantities, and no
        /// lot is ever negative.
        #[test]
        fn ledger_identity_holds(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let engine = engine();
            let item = engine.register_item(spec("PROP-1", "ea", 0.0), None).unwrap();

            for op in ops {
                // Infeasible issues and no-op adjustments abort with no
                // writes; both outcomes are valid here.
                match op {
                    Op::Receive(q) => {
                        engine.receive_stock(receive(&item, q as f64, None, None)).unwrap();
                    }
                    Op::Issue(q) => {
                        let _ = engine.issue_stock(issue(&item, q as f64));
                    }
                    Op::AdjustFirstLot(q) => {
                        if let Some(lot) = engine.lots(item.id).unwrap().first() {
                            let _ = engine.adjust_stock(AdjustStock {
                                item_id: item.id,
                                lot_id: lot.id,
                                new_quantity: q as f64,
                                reason: "recount".to_string(),
                                performed_by: None,
                            });
                        }
                    }
                }

                let on_hand = engine.current_stock(item.id).unwrap();
                prop_assert_eq!(signed_sum(&engine, item.id), on_hand);
                prop_assert_eq!(lot_sum(&engine, item.id), on_hand);
                prop_assert!(engine.lots(item.id).unwrap().iter().all(|l| l.quantity >= 0.0));
            }
        }
    }
}
