use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use gyaledger_core::EntityId;

/// One immutable row per business action: who did what to which entity,
/// with before/after snapshots and the bank ids the action touched.
/// Write-only from the engine's perspective, read-only everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: EntityId,
    /// Action tag, e.g. "venta.crear", "venta.abono", "banco.transferencia".
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub actor: Option<String>,
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
    pub description: String,
    pub amount: Option<f64>,
    pub affected_banks: Vec<EntityId>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditLogEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        actor: Option<String>,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
        description: impl Into<String>,
        amount: Option<f64>,
        affected_banks: Vec<EntityId>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            actor,
            before,
            after,
            description: description.into(),
            amount,
            affected_banks,
            occurred_at,
        }
    }
}
