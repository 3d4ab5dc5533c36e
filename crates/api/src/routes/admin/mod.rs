//! Back-office routes. Every handler requires an admin token via
//! `RequireAdmin`, and every mutation writes an audit entry.

pub mod audit;
pub mod deals;
pub mod orders;
pub mod products;
pub mod settings;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the admin router, nested under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
        .nest("/deals", deals::router())
        .nest("/settings", settings::router())
        .nest("/audit", audit::router())
        .nest("/uploads", uploads::router())
}
