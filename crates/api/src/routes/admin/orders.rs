//! Admin order management.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use serde_json::json;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::{NewAuditEntry, Order};
use crate::routes::extract::PathParam;
use crate::services::audit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}/deliver", put(deliver))
}

/// Every order with its customer's name, newest first.
///
/// GET /api/admin/orders
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_all().await?))
}

/// Mark a paid order delivered.
///
/// PUT /api/admin/orders/{id}/deliver
#[instrument(skip(state, admin, request_id), fields(admin_id = %admin.id()))]
async fn deliver(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .mark_delivered(id)
        .await??;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "order.deliver", "order")
            .entity(id)
            .details(json!({ "total": order.total_price }))
            .request_id(request_id),
    )
    .await;

    Ok(Json(order))
}
