//! Customer order routes.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use tracing::instrument;

use bazaar_core::OrderId;

use super::extract::{JsonBody, PathParam};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::CreateOrderRequest;
use crate::models::{Order, PaymentResult};
use crate::services::CheckoutService;
use crate::state::AppState;

/// Header carrying the client's retry key for `POST /api/orders`.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 255;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(mine))
        .route("/{id}", get(show))
        .route("/{id}/pay", put(pay))
}

/// Read and check the `Idempotency-Key` header.
fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Idempotency-Key must be ASCII".to_string()))?
        .trim();
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Idempotency-Key must be 1 to {MAX_IDEMPOTENCY_KEY_LENGTH} characters"
        )));
    }
    Ok(Some(key.to_owned()))
}

/// Place an order.
///
/// POST /api/orders
///
/// Responds 201 for a new order and 200 when an `Idempotency-Key` retry
/// returns the order created earlier.
#[instrument(skip(state, current, headers, request), fields(user_id = %current.id()))]
async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    headers: HeaderMap,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let key = idempotency_key(&headers)?;
    let settings = state.settings().get(state.pool()).await?;

    let (order, created) = CheckoutService::new(state.pool(), settings.pricing)
        .place_order(current.id(), &request, key.as_deref())
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(order)))
}

/// The caller's orders, newest first.
///
/// GET /api/orders/mine
#[instrument(skip(state, current), fields(user_id = %current.id()))]
async fn mine(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(current.id())
        .await?;
    Ok(Json(orders))
}

/// One order, visible to its owner and to admins.
///
/// GET /api/orders/{id}
#[instrument(skip(state, current), fields(user_id = %current.id()))]
async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|order| current.is_admin() || order.is_owned_by(current.id()))
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

/// Record the payment provider's result for the caller's order.
///
/// PUT /api/orders/{id}/pay
#[instrument(skip(state, current, payment), fields(user_id = %current.id()))]
async fn pay(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    PathParam(id): PathParam<OrderId>,
    JsonBody(payment): JsonBody<PaymentResult>,
) -> Result<Json<Order>> {
    let payment = payment.validated()?;
    let repo = OrderRepository::new(state.pool());

    repo.get(id)
        .await?
        .filter(|order| order.is_owned_by(current.id()))
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let order = repo.mark_paid(id, &payment).await??;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_idempotency_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(idempotency_key(&headers).unwrap(), None);

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static(" abc-123 "));
        assert_eq!(idempotency_key(&headers).unwrap().as_deref(), Some("abc-123"));

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("  "));
        assert!(idempotency_key(&headers).is_err());

        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LENGTH + 1);
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_str(&long).unwrap());
        assert!(idempotency_key(&headers).is_err());
    }
}
