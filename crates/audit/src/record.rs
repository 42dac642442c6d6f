use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use stockledger_core::AuditId;

/// Which entity a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    StockLot,
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Adjust,
    Deactivate,
}

/// Structured snapshot of an entity's state, tagged by entity kind.
///
/// The payload is opaque JSON supplied by the writer; the trail stores it
/// verbatim. Readers dispatch on the tag to deserialize the shape they
/// expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "state", rename_all = "snake_case")]
pub enum AuditSnapshot {
    Item(JsonValue),
    StockLot(JsonValue),
}

impl AuditSnapshot {
    pub fn entity(&self) -> EntityKind {
        match self {
            AuditSnapshot::Item(_) => EntityKind::Item,
            AuditSnapshot::StockLot(_) => EntityKind::StockLot,
        }
    }
}

/// One immutable audit record.
///
/// `before` is `None` for creations; `after` is the post-state (present on
/// every action here, deactivation included, since items are never
/// physically deleted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub entity: EntityKind,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub performed_by: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub before: Option<AuditSnapshot>,
    pub after: Option<AuditSnapshot>,
    pub reason: Option<String>,
}

impl AuditRecord {
    /// Pure append: builds the record, interprets nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        id: AuditId,
        entity: EntityKind,
        entity_id: Uuid,
        action: AuditAction,
        before: Option<AuditSnapshot>,
        after: Option<AuditSnapshot>,
        performed_by: Option<String>,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            entity,
            entity_id,
            action,
            performed_by,
            timestamp,
            before,
            after,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creation_record_has_no_before() {
        let rec = AuditRecord::record(
            AuditId::new(),
            EntityKind::Item,
            Uuid::now_v7(),
            AuditAction::Create,
            None,
            Some(AuditSnapshot::Item(json!({"active": true}))),
            Some("user-1".to_string()),
            None,
            Utc::now(),
        );
        assert!(rec.before.is_none());
        assert_eq!(rec.after.as_ref().unwrap().entity(), EntityKind::Item);
    }

    #[test]
    fn snapshot_tag_is_entity_keyed() {
        let snap = AuditSnapshot::StockLot(json!({"quantity": 5.0}));
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["entity"], "stock_lot");
        assert_eq!(value["state"]["quantity"], 5.0);

        let back: AuditSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snap);
    }
}
