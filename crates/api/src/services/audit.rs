//! Admin audit trail.

use sqlx::PgPool;
use tracing::{error, info};

use crate::db::AuditRepository;
use crate::models::NewAuditEntry;

/// Record an admin action.
///
/// The action has already happened by the time this runs, so a failed write
/// is logged and reported to Sentry instead of failing the request.
pub async fn record(pool: &PgPool, entry: NewAuditEntry) {
    info!(
        target: "audit",
        actor_id = %entry.actor_id,
        action = entry.action,
        entity_type = entry.entity_type,
        entity_id = entry.entity_id.as_deref().unwrap_or("-"),
        request_id = entry.request_id.as_deref().unwrap_or("-"),
        "Admin action"
    );

    if let Err(e) = AuditRepository::new(pool).record(&entry).await {
        let event_id = sentry::capture_error(&e);
        error!(
            error = %e,
            action = entry.action,
            sentry_event_id = %event_id,
            "Failed to write audit entry"
        );
    }
}
