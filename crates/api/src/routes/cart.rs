//! Cart quote route.
//!
//! The cart itself lives in the browser. This endpoint re-prices it against
//! the current catalog, deals, and pricing policy.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tracing::instrument;

use super::extract::JsonBody;
use crate::error::Result;
use crate::models::order::LineRequest;
use crate::services::{CheckoutService, Quote};
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<LineRequest>,
}

/// POST /api/cart/quote
#[instrument(skip(state, request), fields(lines = request.items.len()))]
async fn quote(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<QuoteRequest>,
) -> Result<Json<Quote>> {
    let settings = state.settings().get(state.pool()).await?;
    let quote = CheckoutService::new(state.pool(), settings.pricing)
        .quote(&request.items)
        .await?;
    Ok(Json(quote))
}
