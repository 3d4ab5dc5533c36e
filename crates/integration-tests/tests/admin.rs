//! Integration tests for the admin back office.
//!
//! These tests require a running API seeded with `crates/cli/seed/catalog.yaml`,
//! whose admin account they log in as.

#![allow(clippy::expect_used)]

use std::time::Duration;

use chrono::Utc;

use bazaar_integration_tests::{Session, client, login_admin, register_customer, url};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

async fn create_product(client: &Client, admin: &Session, stock: i64) -> Value {
    let resp = admin
        .authorize(client.post(url("/api/admin/products")))
        .json(&json!({
            "name": format!("IT Product {}", Uuid::new_v4().simple()),
            "brand": "Integration",
            "category": "Testing",
            "description": "Created by the integration suite",
            "price": "40.00",
            "countInStock": stock,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Invalid product")
}

async fn delete_product(client: &Client, admin: &Session, id: i64) {
    let resp = admin
        .authorize(client.delete(url(&format!("/api/admin/products/{id}"))))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_customers_cannot_reach_admin_routes() {
    let client = client();
    let customer = register_customer(&client).await;

    for path in ["/api/admin/orders", "/api/admin/users", "/api/admin/audit"] {
        let resp = customer
            .authorize(client.get(url(path)))
            .send()
            .await
            .expect("Failed to send");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path}");

        let body: Value = resp.json().await.expect("Invalid error body");
        assert_eq!(body["error"], "Not authorized as an admin");
    }
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_product_lifecycle_is_audited() {
    let client = client();
    let admin = login_admin(&client).await;
    let product = create_product(&client, &admin, 3).await;
    let id = product["id"].as_i64().expect("product id");

    let resp = admin
        .authorize(client.put(url(&format!("/api/admin/products/{id}"))))
        .json(&json!({
            "name": product["name"],
            "price": "35.00",
            "countInStock": 4,
        }))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid product");
    assert_eq!(updated["price"], "35.00");

    delete_product(&client, &admin, id).await;

    let audit: Value = admin
        .authorize(client.get(url("/api/admin/audit")))
        .send()
        .await
        .expect("Failed to read audit log")
        .json()
        .await
        .expect("Invalid audit page");

    let entity = id.to_string();
    let actions: Vec<&str> = audit["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .filter(|e| e["entityType"] == "product" && e["entityId"] == entity.as_str())
        .filter_map(|e| e["action"].as_str())
        .collect();
    assert_eq!(
        actions,
        ["product.delete", "product.update", "product.create"]
    );
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_live_deal_discounts_quote() {
    let client = client();
    let admin = login_admin(&client).await;
    let product = create_product(&client, &admin, 5).await;
    let id = product["id"].as_i64().expect("product id");

    let resp = admin
        .authorize(client.post(url("/api/admin/deals")))
        .json(&json!({
            "productId": id,
            "discountPercent": 25,
            "endsAt": "2099-01-01T00:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to create deal");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let deal: Value = resp.json().await.expect("Invalid deal");

    let detail: Value = client
        .get(url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("Invalid product");
    assert_eq!(detail["deal"]["dealPrice"], "30.00");

    let quote: Value = client
        .post(url("/api/cart/quote"))
        .json(&json!({ "items": [{ "productId": id, "qty": 1 }] }))
        .send()
        .await
        .expect("Failed to quote")
        .json()
        .await
        .expect("Invalid quote");
    assert_eq!(quote["lines"][0]["unitPrice"], "30.00");
    assert_eq!(quote["lines"][0]["listPrice"], "40.00");
    assert_eq!(quote["lines"][0]["dealId"], deal["id"]);

    // Switching the deal off restores the list price
    let resp = admin
        .authorize(client.post(url(&format!("/api/admin/deals/{}/toggle", deal["id"]))))
        .send()
        .await
        .expect("Failed to toggle deal");
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = client
        .get(url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("Invalid product");
    assert!(detail["deal"].is_null());

    delete_product(&client, &admin, id).await;
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_deliver_requires_payment() {
    let client = client();
    let admin = login_admin(&client).await;
    let customer = register_customer(&client).await;
    let product = create_product(&client, &admin, 2).await;

    let order: Value = customer
        .authorize(client.post(url("/api/orders")))
        .json(&json!({
            "items": [{ "productId": product["id"], "qty": 1 }],
            "shippingAddress": bazaar_integration_tests::shipping_address(),
            "paymentMethod": "paypal",
        }))
        .send()
        .await
        .expect("Failed to place order")
        .json()
        .await
        .expect("Invalid order");

    let resp = admin
        .authorize(client.put(url(&format!("/api/admin/orders/{}/deliver", order["id"]))))
        .send()
        .await
        .expect("Failed to deliver");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

async fn fetch_order(client: &Client, session: &Session, id: &Value) -> Value {
    let resp = session
        .authorize(client.get(url(&format!("/api/orders/{id}"))))
        .send()
        .await
        .expect("Failed to fetch order");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Invalid order")
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_order_snapshot_survives_catalog_changes() {
    let client = client();
    let admin = login_admin(&client).await;
    let customer = register_customer(&client).await;
    let product = create_product(&client, &admin, 2).await;
    let id = product["id"].as_i64().expect("product id");

    let resp = customer
        .authorize(client.post(url("/api/orders")))
        .json(&json!({
            "items": [{ "productId": id, "qty": 1 }],
            "shippingAddress": bazaar_integration_tests::shipping_address(),
            "paymentMethod": "paypal",
        }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Invalid order");
    let order_id = &placed["id"];

    let resp = admin
        .authorize(client.put(url(&format!("/api/admin/products/{id}"))))
        .json(&json!({
            "name": "Renamed after checkout",
            "price": "99.00",
            "countInStock": 1,
        }))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);

    let repriced = fetch_order(&client, &customer, order_id).await;
    let item = &repriced["items"][0];
    assert_eq!(item["unitPrice"], "40.00");
    assert_eq!(item["listPrice"], "40.00");
    assert_eq!(item["name"], product["name"]);
    assert_eq!(item["productId"], id);
    assert_eq!(repriced["totalPrice"], placed["totalPrice"]);

    delete_product(&client, &admin, id).await;

    let orphaned = fetch_order(&client, &customer, order_id).await;
    let item = &orphaned["items"][0];
    assert!(item["productId"].is_null());
    assert_eq!(item["unitPrice"], "40.00");
    assert_eq!(item["listPrice"], "40.00");
    assert_eq!(item["name"], product["name"]);
    assert_eq!(item["qty"], 1);
    assert_eq!(orphaned["totalPrice"], placed["totalPrice"]);
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_expired_deal_frees_the_active_slot() {
    let client = client();
    let admin = login_admin(&client).await;
    let product = create_product(&client, &admin, 5).await;
    let id = product["id"].as_i64().expect("product id");

    let ends_at = Utc::now() + chrono::Duration::seconds(2);
    let resp = admin
        .authorize(client.post(url("/api/admin/deals")))
        .json(&json!({
            "productId": id,
            "discountPercent": 10,
            "endsAt": ends_at.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to create deal");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let lapsed: Value = resp.json().await.expect("Invalid deal");

    tokio::time::sleep(Duration::from_secs(3)).await;

    let resp = admin
        .authorize(client.post(url("/api/admin/deals")))
        .json(&json!({
            "productId": id,
            "discountPercent": 20,
            "endsAt": "2099-01-01T00:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to create deal");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let deals: Value = admin
        .authorize(client.get(url("/api/admin/deals")))
        .send()
        .await
        .expect("Failed to list deals")
        .json()
        .await
        .expect("Invalid deal list");
    let old = deals
        .as_array()
        .expect("deal list")
        .iter()
        .find(|d| d["id"] == lapsed["id"])
        .expect("lapsed deal still listed");
    assert_eq!(old["isActive"], false);

    delete_product(&client, &admin, id).await;
}
