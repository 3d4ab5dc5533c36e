//! Admin catalog management.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{post, put},
};
use serde_json::json;
use tracing::instrument;

use bazaar_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::{NewAuditEntry, Product, ProductInput};
use crate::routes::extract::{JsonBody, PathParam};
use crate::services::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(remove))
}

/// POST /api/admin/products
#[instrument(skip(state, admin, request_id, input), fields(admin_id = %admin.id()))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = input.validated()?;
    let product = ProductRepository::new(state.pool())
        .create(Some(admin.id()), &input)
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "product.create", "product")
            .entity(product.id)
            .details(json!({ "name": product.name, "price": product.price }))
            .request_id(request_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
#[instrument(skip(state, admin, request_id, input), fields(admin_id = %admin.id()))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<ProductId>,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<Json<Product>> {
    let input = input.validated()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "product.update", "product")
            .entity(id)
            .details(json!({
                "name": product.name,
                "price": product.price,
                "countInStock": product.count_in_stock,
            }))
            .request_id(request_id),
    )
    .await;

    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
///
/// Orders keep their item snapshots; only the product link is cleared.
#[instrument(skip(state, admin, request_id), fields(admin_id = %admin.id()))]
async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "product.delete", "product")
            .entity(id)
            .request_id(request_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
