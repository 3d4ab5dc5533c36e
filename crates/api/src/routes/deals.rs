//! Public daily-deal routes.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use tracing::instrument;

use crate::db::DealRepository;
use crate::error::Result;
use crate::models::LiveDeal;
use crate::state::AppState;

/// Build the deals router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Live deals with their products and countdowns.
///
/// GET /api/deals
#[instrument(skip(state))]
async fn index(State(state): State<AppState>) -> Result<Json<Vec<LiveDeal>>> {
    let now = Utc::now();
    let deals = DealRepository::new(state.pool())
        .live_with_products(now)
        .await?
        .into_iter()
        .map(|(deal, product)| LiveDeal::new(&deal, product, now))
        .collect();
    Ok(Json(deals))
}
