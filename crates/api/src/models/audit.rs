//! Audit trail entries for admin mutations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use bazaar_core::{AuditEntryId, UserId};

/// A recorded admin action.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor_id: Option<UserId>,
    /// Actor's name, when the account still exists.
    pub actor_name: Option<String>,
    /// Verb such as `product.create` or `order.deliver`.
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: JsonValue,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry to record.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: UserId,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<String>,
    pub details: JsonValue,
    pub request_id: Option<String>,
}

impl NewAuditEntry {
    #[must_use]
    pub fn new(actor_id: UserId, action: &'static str, entity_type: &'static str) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id: None,
            details: JsonValue::Object(serde_json::Map::new()),
            request_id: None,
        }
    }

    #[must_use]
    pub fn entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }

    #[must_use]
    pub fn request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}
