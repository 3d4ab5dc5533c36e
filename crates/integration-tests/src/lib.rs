//! Integration tests for Bazaar.
//!
//! The HTTP tests are `#[ignore]`d because they need a live server with the
//! demo catalog loaded:
//!
//! ```bash
//! bazaar migrate
//! bazaar seed crates/cli/seed/catalog.yaml
//! cargo run -p bazaar-api &
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_BASE_URL` - Server under test (default `http://localhost:5000`)
//! - `BAZAAR_ADMIN_EMAIL` / `BAZAAR_ADMIN_PASSWORD` - Seeded admin account

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("BAZAAR_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Absolute URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url().trim_end_matches('/'))
}

/// HTTP client for tests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// A logged-in account.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub email: String,
    pub token: String,
    pub is_admin: bool,
}

impl Session {
    fn from_auth_response(body: &Value) -> Self {
        Self {
            id: body["id"].as_i64().expect("auth response has id"),
            email: body["email"]
                .as_str()
                .expect("auth response has email")
                .to_string(),
            token: body["token"]
                .as_str()
                .expect("auth response has token")
                .to_string(),
            is_admin: body["isAdmin"].as_bool().unwrap_or(false),
        }
    }

    /// Attach this session's bearer token.
    #[must_use]
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

/// Register a fresh customer with a unique email.
pub async fn register_customer(client: &Client) -> Session {
    let email = format!("it-{}@example.com", Uuid::new_v4().simple());
    let resp = client
        .post(url("/api/users"))
        .json(&json!({
            "name": "Integration Tester",
            "email": email,
            "password": "integration-pass-1",
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Invalid register response");
    Session::from_auth_response(&body)
}

/// Log in as the seeded admin.
pub async fn login_admin(client: &Client) -> Session {
    let email =
        std::env::var("BAZAAR_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password =
        std::env::var("BAZAAR_ADMIN_PASSWORD").unwrap_or_else(|_| "changeme123".to_string());

    let resp = client
        .post(url("/api/users/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in as admin");

    assert_eq!(resp.status(), StatusCode::OK, "seeded admin must exist");
    let body: Value = resp.json().await.expect("Invalid login response");
    let session = Session::from_auth_response(&body);
    assert!(session.is_admin, "seeded admin must have the admin role");
    session
}

/// First catalog product with at least `min_stock` units.
pub async fn product_in_stock(client: &Client, min_stock: i64) -> Value {
    let body: Value = client
        .get(url("/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid product list");

    body["products"]
        .as_array()
        .expect("products array")
        .iter()
        .find(|p| p["countInStock"].as_i64().unwrap_or(0) >= min_stock)
        .cloned()
        .expect("seeded catalog has a product in stock")
}

/// A shipping address that passes validation.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "address": "1 Market Street",
        "city": "Springfield",
        "postalCode": "12345",
        "country": "US",
    })
}
