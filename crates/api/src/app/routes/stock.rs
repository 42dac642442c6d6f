use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use stockledger_core::{ItemId, LotId};
use stockledger_engine::{AdjustStock, IssueStock, ReceiveStock};
use stockledger_ledger::LotInfo;

use crate::app::{dto, errors, Engine};

pub fn router() -> Router {
    Router::new()
        .route("/items/:id/receive", post(receive_stock))
        .route("/items/:id/issue", post(issue_stock))
        .route("/items/:id/lots/:lot_id/adjust", post(adjust_stock))
        .route("/items/:id/stock", get(current_stock))
        .route("/items/:id/lots", get(list_lots))
        .route("/items/:id/transactions", get(transaction_history))
        .route("/reports/low-stock", get(low_stock))
}

fn parse_item_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn receive_stock(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let req = ReceiveStock {
        item_id,
        quantity: body.quantity,
        unit: body.unit,
        lot: LotInfo {
            lot_code: body.lot_code,
            manufacture_date: body.manufacture_date,
            expiry_date: body.expiry_date,
        },
        location_id: body.location_id,
        unit_cost: body.unit_cost,
        source: body.source,
        performed_by: body.performed_by,
        reference: body.reference,
    };

    match engine.receive_stock(req) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn issue_stock(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
    Json(body): Json<dto::IssueStockRequest>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let req = IssueStock {
        item_id,
        quantity: body.quantity,
        unit: body.unit,
        performed_by: body.performed_by,
        reference: body.reference,
        note: body.note,
    };

    match engine.issue_stock(req) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(engine): Extension<Engine>,
    Path((id, lot_id)): Path<(String, String)>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lot_id: LotId = match lot_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let req = AdjustStock {
        item_id,
        lot_id,
        new_quantity: body.new_quantity,
        reason: body.reason,
        performed_by: body.performed_by,
    };

    match engine.adjust_stock(req) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn current_stock(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match engine.current_stock(item_id) {
        Ok(quantity) => Json(json!({ "item_id": item_id, "quantity": quantity })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_lots(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match engine.lots(item_id) {
        Ok(lots) => Json(lots).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn transaction_history(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = match parse_item_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match engine.transaction_history(item_id) {
        Ok(history) => Json(history).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn low_stock(Extension(engine): Extension<Engine>) -> axum::response::Response {
    match engine.low_stock() {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
