//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (DB ping)
//! GET  /uploads/{file}              - Uploaded product images
//!
//! # Catalog
//! GET  /api/products                - Search (?keyword=&category=&page=)
//! GET  /api/products/top            - Top rated
//! GET  /api/products/categories     - Distinct categories
//! GET  /api/products/{id}           - Detail with reviews and live deal
//! POST /api/products/{id}/reviews   - Review (auth)
//!
//! # Deals, cart, settings
//! GET  /api/deals                   - Live deals with countdowns
//! POST /api/cart/quote              - Server-side cart pricing
//! GET  /api/settings/public         - Store info and pricing policy
//!
//! # Accounts
//! POST /api/users                   - Register (auth rate limit)
//! POST /api/users/login             - Login (auth rate limit)
//! POST /api/users/logout            - Revoke token (auth)
//! GET  /api/users/profile           - Own profile (auth)
//! PUT  /api/users/profile           - Update own profile (auth)
//!
//! # Orders (auth)
//! POST /api/orders                  - Checkout (Idempotency-Key header)
//! GET  /api/orders/mine             - Own orders
//! GET  /api/orders/{id}             - Owner or admin
//! PUT  /api/orders/{id}/pay         - Record payment (owner)
//!
//! # Admin (admin token)
//! POST|PUT|DELETE /api/admin/products[/{id}]
//! GET  /api/admin/orders, PUT /api/admin/orders/{id}/deliver
//! GET|PUT|DELETE  /api/admin/users[/{id}]
//! GET|POST|PUT|DELETE /api/admin/deals[/{id}], POST /api/admin/deals/{id}/toggle
//! GET|PUT /api/admin/settings
//! GET  /api/admin/audit?page=
//! POST /api/admin/uploads           - Multipart `image`
//! ```

pub mod admin;
pub mod cart;
pub mod deals;
pub mod extract;
pub mod health;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use axum::Router;

use crate::error::AppError;
use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/deals", deals::router())
        .nest("/cart", cart::router())
        .nest("/settings", settings::router())
        .nest("/users", users::router())
        .nest("/orders", orders::router())
        .nest("/admin", admin::router())
        .layer(api_rate_limiter())
}

/// JSON 404 for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
