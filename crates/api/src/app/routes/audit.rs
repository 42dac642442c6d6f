use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use stockledger_audit::EntityKind;

use crate::app::{errors, Engine};

pub fn router() -> Router {
    Router::new().route("/audit/:entity/:entity_id", get(audit_history))
}

fn parse_entity(s: &str) -> Result<EntityKind, axum::response::Response> {
    match s {
        "item" => Ok(EntityKind::Item),
        "stock_lot" => Ok(EntityKind::StockLot),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_entity",
            "entity must be one of: item, stock_lot",
        )),
    }
}

pub async fn audit_history(
    Extension(engine): Extension<Engine>,
    Path((entity, entity_id)): Path<(String, String)>,
) -> axum::response::Response {
    let entity = match parse_entity(&entity) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let entity_id: Uuid = match entity_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "entity_id must be a uuid",
            )
        }
    };

    match engine.audit_history(entity, entity_id) {
        Ok(records) => Json(records).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
