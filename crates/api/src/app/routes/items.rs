use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockledger_catalog::{ItemSpec, ItemUpdate};
use stockledger_core::ItemId;

use crate::app::{dto, errors, Engine};

pub fn router() -> Router {
    Router::new()
        .route("/items", post(register_item).get(list_items))
        .route("/items/:id", get(get_item).patch(update_item))
        .route("/items/:id/deactivate", post(deactivate_item))
}

pub async fn register_item(
    Extension(engine): Extension<Engine>,
    Json(body): Json<dto::RegisterItemRequest>,
) -> axum::response::Response {
    let spec = ItemSpec {
        sku: body.sku,
        name: body.name,
        description: body.description,
        unit: body.unit,
        reorder_point: body.reorder_point,
        lead_time_days: body.lead_time_days,
        industry_id: body.industry_id,
    };

    match engine.register_item(spec, body.performed_by) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_items(Extension(engine): Extension<Engine>) -> axum::response::Response {
    match engine.list_active() {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.lookup(id) {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let update = ItemUpdate {
        name: body.name,
        description: body.description,
        reorder_point: body.reorder_point,
        lead_time_days: body.lead_time_days,
    };

    match engine.update_item(id, update, body.performed_by) {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn deactivate_item(
    Extension(engine): Extension<Engine>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeactivateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.deactivate_item(id, body.reason, body.performed_by) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
