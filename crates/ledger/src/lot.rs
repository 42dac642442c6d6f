use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_catalog::InventoryItem;
use stockledger_core::{DomainError, DomainResult, ItemId, LocationId, LotId};

/// Optional lot/batch metadata supplied at receipt time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotInfo {
    /// Supplier or internal batch code (e.g. "L1", "BATCH-2025-03").
    pub lot_code: Option<String>,
    pub manufacture_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl LotInfo {
    fn validate(&self) -> DomainResult<()> {
        if let (Some(mfg), Some(exp)) = (self.manufacture_date, self.expiry_date) {
            if exp < mfg {
                return Err(DomainError::validation(
                    "expiry_date cannot be before manufacture_date",
                ));
            }
        }
        Ok(())
    }
}

/// One physical batch of an item.
///
/// Quantity is non-negative at all times. A lot that is drawn down to zero
/// stays in the ledger as a historical record; it is never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: LotId,
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit: String,
    pub lot_code: Option<String>,
    pub manufacture_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub location_id: LocationId,
    pub received_at: DateTime<Utc>,
    pub unit_cost: Option<f64>,
    /// Supplier reference or intake note.
    pub source: Option<String>,
}

impl StockLot {
    /// Validate a receipt and produce the new lot.
    ///
    /// Fails if the item is inactive, the quantity is not strictly
    /// positive, the unit does not match the item's canonical unit, or the
    /// lot dates are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn receive(
        id: LotId,
        item: &InventoryItem,
        quantity: f64,
        unit: &str,
        info: LotInfo,
        location_id: LocationId,
        unit_cost: Option<f64>,
        source: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !item.active {
            return Err(DomainError::validation(format!(
                "item {} is inactive",
                item.sku
            )));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation("quantity must be > 0"));
        }
        if unit != item.unit {
            return Err(DomainError::validation(format!(
                "unit mismatch: lot unit '{}' does not match item unit '{}'",
                unit, item.unit
            )));
        }
        if let Some(cost) = unit_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(DomainError::validation("unit_cost must be >= 0"));
            }
        }
        info.validate()?;

        Ok(Self {
            id,
            item_id: item.id,
            quantity,
            unit: unit.to_string(),
            lot_code: info.lot_code,
            manufacture_date: info.manufacture_date,
            expiry_date: info.expiry_date,
            location_id,
            received_at: now,
            unit_cost,
            source,
        })
    }

    /// Transition to a corrected quantity (stock count, shrinkage).
    pub fn with_quantity(&self, new_quantity: f64) -> DomainResult<Self> {
        if !new_quantity.is_finite() || new_quantity < 0.0 {
            return Err(DomainError::validation("quantity must be >= 0"));
        }
        let mut next = self.clone();
        next.quantity = new_quantity;
        Ok(next)
    }
}
