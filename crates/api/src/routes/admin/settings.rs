//! Admin site settings.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::settings::SettingsUpdate;
use crate::models::{NewAuditEntry, PublicSettings};
use crate::routes::extract::JsonBody;
use crate::services::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show).put(update))
}

/// GET /api/admin/settings
async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<PublicSettings>> {
    Ok(Json(state.settings().get(state.pool()).await?))
}

/// PUT /api/admin/settings
///
/// Sections left out of the body keep their current value.
#[instrument(skip(state, admin, request_id, update), fields(admin_id = %admin.id()))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    JsonBody(update): JsonBody<SettingsUpdate>,
) -> Result<Json<PublicSettings>> {
    let settings = state.settings().update(state.pool(), &update).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "settings.update", "setting")
            .details(json!({
                "store": update.store.is_some().then_some(&settings.store),
                "pricing": update.pricing.is_some().then_some(&settings.pricing),
            }))
            .request_id(request_id),
    )
    .await;

    Ok(Json(settings))
}
