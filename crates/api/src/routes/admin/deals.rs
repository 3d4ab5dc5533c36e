//! Admin daily-deal management.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use bazaar_core::{DealId, ValidationError};

use crate::db::DealRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::{Deal, DealInput, NewAuditEntry};
use crate::routes::extract::{JsonBody, PathParam};
use crate::services::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", put(update).delete(remove))
        .route("/{id}/toggle", post(toggle))
}

fn deal_details(deal: &Deal) -> serde_json::Value {
    json!({
        "productId": deal.product_id,
        "discountPercent": deal.discount_percent,
        "endsAt": deal.ends_at,
        "isActive": deal.is_active,
    })
}

/// GET /api/admin/deals
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Deal>>> {
    Ok(Json(DealRepository::new(state.pool()).list().await?))
}

/// POST /api/admin/deals
#[instrument(skip(state, admin, request_id, input), fields(admin_id = %admin.id()))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    JsonBody(input): JsonBody<DealInput>,
) -> Result<(StatusCode, Json<Deal>)> {
    let valid = input.validated(Utc::now())?;
    let deal = DealRepository::new(state.pool())
        .create(&valid, admin.id())
        .await
        .map_err(|e| not_found_as("Product not found", e))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "deal.create", "deal")
            .entity(deal.id)
            .details(deal_details(&deal))
            .request_id(request_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(deal)))
}

/// PUT /api/admin/deals/{id}
#[instrument(skip(state, admin, request_id, input), fields(admin_id = %admin.id()))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<DealId>,
    JsonBody(input): JsonBody<DealInput>,
) -> Result<Json<Deal>> {
    let valid = input.validated(Utc::now())?;
    let deal = DealRepository::new(state.pool())
        .update(id, &valid)
        .await
        .map_err(|e| not_found_as("Deal or product not found", e))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "deal.update", "deal")
            .entity(id)
            .details(deal_details(&deal))
            .request_id(request_id),
    )
    .await;

    Ok(Json(deal))
}

/// Flip a deal on or off. A deal that has already ended cannot be switched
/// back on.
///
/// POST /api/admin/deals/{id}/toggle
#[instrument(skip(state, admin, request_id), fields(admin_id = %admin.id()))]
async fn toggle(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<DealId>,
) -> Result<Json<Deal>> {
    let repo = DealRepository::new(state.pool());
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

    let activate = !current.is_active;
    if activate && current.ends_at <= Utc::now() {
        return Err(ValidationError::new("endsAt", "deal has already ended").into());
    }
    let deal = repo.set_active(id, activate).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "deal.toggle", "deal")
            .entity(id)
            .details(json!({ "isActive": deal.is_active }))
            .request_id(request_id),
    )
    .await;

    Ok(Json(deal))
}

/// DELETE /api/admin/deals/{id}
#[instrument(skip(state, admin, request_id), fields(admin_id = %admin.id()))]
async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<DealId>,
) -> Result<StatusCode> {
    if !DealRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Deal not found".to_string()));
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "deal.delete", "deal")
            .entity(id)
            .request_id(request_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

fn not_found_as(message: &str, e: crate::db::RepositoryError) -> AppError {
    match e {
        crate::db::RepositoryError::NotFound => AppError::NotFound(message.to_string()),
        other => other.into(),
    }
}
