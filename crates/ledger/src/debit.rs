//! FEFO/FIFO debit planning.
//!
//! Selecting which lots to draw down is a pure function over the item's
//! current lots. The plan is returned by value and persisted atomically by
//! the engine, so a failed issue never leaves one lot drained while others
//! were untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, LotId};

use crate::lot::StockLot;

/// One lot's share of an issue, with the pre/post quantities the audit
/// trail records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotDebit {
    pub lot_id: LotId,
    pub quantity_taken: f64,
    pub quantity_before: f64,
    pub quantity_after: f64,
}

/// The outcome of planning a debit: per-lot takes plus the updated lot
/// states, ready to be committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitPlan {
    pub debits: Vec<LotDebit>,
    pub updated_lots: Vec<StockLot>,
}

/// Ordering key for lot selection.
///
/// Lots without an expiry date are drawn first, by receipt time (FIFO);
/// dated lots follow in expiry order (FEFO), receipt time as tie-break,
/// lot id as the final deterministic tie-break.
fn selection_key(lot: &StockLot) -> (bool, Option<DateTime<Utc>>, DateTime<Utc>, LotId) {
    (
        lot.expiry_date.is_some(),
        lot.expiry_date,
        lot.received_at,
        lot.id,
    )
}

/// Plan a debit of `quantity` against the given lots.
///
/// Fails with `InsufficientStock` if the lots cannot cover the quantity;
/// in that case nothing is taken from any lot. Zero-quantity lots are
/// skipped but remain untouched historical records.
pub fn plan_debits(lots: &[StockLot], quantity: f64) -> DomainResult<DebitPlan> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(DomainError::validation("quantity must be > 0"));
    }

    let available: f64 = lots.iter().map(|l| l.quantity).sum();
    if available < quantity {
        return Err(DomainError::InsufficientStock {
            requested: quantity,
            available,
        });
    }

    let mut ordered: Vec<&StockLot> = lots.iter().filter(|l| l.quantity > 0.0).collect();
    ordered.sort_by_key(|l| selection_key(l));

    let mut remaining = quantity;
    let mut debits = Vec::new();
    let mut updated_lots = Vec::new();

    for lot in ordered {
        if remaining <= 0.0 {
            break;
        }
        let take = remaining.min(lot.quantity);
        let after = lot.quantity - take;
        debits.push(LotDebit {
            lot_id: lot.id,
            quantity_taken: take,
            quantity_before: lot.quantity,
            quantity_after: after,
        });
        updated_lots.push(lot.with_quantity(after)?);
        remaining -= take;
    }

    Ok(DebitPlan {
        debits,
        updated_lots,
    })
}
