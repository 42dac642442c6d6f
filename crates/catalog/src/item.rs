use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, ItemId};

/// Caller-supplied attributes for registering a new catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// Canonical unit of measure (e.g. "ea", "kg", "litre"). Stock lots
    /// must carry exactly this unit; no conversion is performed.
    pub unit: String,
    /// Quantity threshold below which the item shows up in low-stock
    /// reports. Reporting only, no reorder automation.
    pub reorder_point: f64,
    pub lead_time_days: u32,
    /// Opaque reference into the industry/category configuration.
    pub industry_id: Option<String>,
}

/// Partial update of the mutable catalog attributes.
///
/// `None` fields are left unchanged. Identity fields (id, SKU, unit) are
/// fixed at registration: historical lots and transactions reference them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reorder_point: Option<f64>,
    pub lead_time_days: Option<u32>,
}

/// A catalog item.
///
/// Never physically deleted, only deactivated, so historical transactions
/// and lots remain valid references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub reorder_point: f64,
    pub lead_time_days: u32,
    pub industry_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Validate a registration spec and produce the new item.
    ///
    /// SKU uniqueness is a store-level check (it spans all items, active
    /// or not) and is not decided here.
    pub fn register(id: ItemId, spec: ItemSpec, now: DateTime<Utc>) -> DomainResult<Self> {
        if spec.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if spec.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if spec.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if !spec.reorder_point.is_finite() || spec.reorder_point < 0.0 {
            return Err(DomainError::validation("reorder_point must be >= 0"));
        }

        Ok(Self {
            id,
            sku: spec.sku,
            name: spec.name,
            description: spec.description,
            unit: spec.unit,
            reorder_point: spec.reorder_point,
            lead_time_days: spec.lead_time_days,
            industry_id: spec.industry_id,
            active: true,
            created_at: now,
        })
    }

    /// Apply a partial update, returning the new state by value.
    pub fn apply_update(&self, update: ItemUpdate) -> DomainResult<Self> {
        let mut next = self.clone();

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(reorder_point) = update.reorder_point {
            if !reorder_point.is_finite() || reorder_point < 0.0 {
                return Err(DomainError::validation("reorder_point must be >= 0"));
            }
            next.reorder_point = reorder_point;
        }
        if let Some(lead_time_days) = update.lead_time_days {
            next.lead_time_days = lead_time_days;
        }

        Ok(next)
    }

    /// Deactivation transition. Idempotent deactivation is rejected so the
    /// audit trail never records a no-op state change.
    pub fn deactivate(&self) -> DomainResult<Self> {
        if !self.active {
            return Err(DomainError::conflict(format!(
                "item {} is already inactive",
                self.sku
            )));
        }
        let mut next = self.clone();
        next.active = false;
        Ok(next)
    }
}
