use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ItemId, TransactionId};

/// Kind of quantity-changing movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Receipt,
    Issue,
    Adjustment,
}

/// One append-only transaction log entry.
///
/// `quantity` is signed: positive for receipts, negative for issues, the
/// delta for adjustments. Feasibility is validated by the engine before a
/// transaction is ever constructed; the log itself never rejects entries.
/// The ledger identity holds at every commit point: per item, the signed
/// sum of transactions equals the sum of current lot quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    /// User id of whoever performed the movement, when known.
    pub performed_by: Option<String>,
    /// External reference: PO number, invoice, work order.
    pub reference: Option<String>,
    pub note: Option<String>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: TransactionId,
        kind: TransactionKind,
        item_id: ItemId,
        quantity: f64,
        unit: impl Into<String>,
        performed_by: Option<String>,
        reference: Option<String>,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            item_id,
            quantity,
            unit: unit.into(),
            timestamp,
            performed_by,
            reference,
            note,
        }
    }

    /// Receipt: `quantity` must already be validated strictly positive.
    pub fn receipt(
        id: TransactionId,
        item_id: ItemId,
        quantity: f64,
        unit: impl Into<String>,
        performed_by: Option<String>,
        reference: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            TransactionKind::Receipt,
            item_id,
            quantity,
            unit,
            performed_by,
            reference,
            None,
            timestamp,
        )
    }

    /// Issue: records the negated quantity.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        id: TransactionId,
        item_id: ItemId,
        quantity: f64,
        unit: impl Into<String>,
        performed_by: Option<String>,
        reference: Option<String>,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            TransactionKind::Issue,
            item_id,
            -quantity,
            unit,
            performed_by,
            reference,
            note,
            timestamp,
        )
    }

    /// Adjustment: `delta` is the signed correction (new - old).
    pub fn adjustment(
        id: TransactionId,
        item_id: ItemId,
        delta: f64,
        unit: impl Into<String>,
        performed_by: Option<String>,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            TransactionKind::Adjustment,
            item_id,
            delta,
            unit,
            performed_by,
            None,
            note,
            timestamp,
        )
    }
}
