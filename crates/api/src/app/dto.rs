use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockledger_core::LocationId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterItemRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub reorder_point: f64,
    #[serde(default)]
    pub lead_time_days: u32,
    pub industry_id: Option<String>,
    pub performed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reorder_point: Option<f64>,
    pub lead_time_days: Option<u32>,
    pub performed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateItemRequest {
    pub reason: String,
    pub performed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub quantity: f64,
    pub unit: String,
    pub lot_code: Option<String>,
    pub manufacture_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub location_id: LocationId,
    pub unit_cost: Option<f64>,
    pub source: Option<String>,
    pub performed_by: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueStockRequest {
    pub quantity: f64,
    pub unit: String,
    pub performed_by: Option<String>,
    pub reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub new_quantity: f64,
    pub reason: String,
    pub performed_by: Option<String>,
}
