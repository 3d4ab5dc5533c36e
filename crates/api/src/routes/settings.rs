//! Public settings route.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::Result;
use crate::models::PublicSettings;
use crate::state::AppState;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/public", get(public))
}

/// Store info and the pricing policy the client prices carts with.
///
/// GET /api/settings/public
async fn public(State(state): State<AppState>) -> Result<Json<PublicSettings>> {
    Ok(Json(state.settings().get(state.pool()).await?))
}
