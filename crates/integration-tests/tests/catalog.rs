//! Integration tests for the public catalog and cart quotes.
//!
//! These tests require a running API seeded with `crates/cli/seed/catalog.yaml`.

#![allow(clippy::expect_used)]

use bazaar_core::{Money, PricingPolicy};
use bazaar_integration_tests::{client, product_in_stock, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn get_json(path: &str) -> (StatusCode, Value) {
    let resp = client()
        .get(url(path))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.expect("Response is not JSON");
    (status, body)
}

fn money(value: &Value) -> Money {
    serde_json::from_value(value.clone()).expect("Not a money amount")
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_product_list_is_paginated() {
    let (status, body) = get_json("/api/products?page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert!(body["pages"].as_i64().expect("pages") >= 1);
    assert!(!body["products"].as_array().expect("products").is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_keyword_search_is_case_insensitive() {
    let (status, body) = get_json("/api/products?keyword=HEADPHONES").await;
    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().expect("products");
    assert!(
        products
            .iter()
            .all(|p| p["name"].as_str().is_some_and(|n| n.to_lowercase().contains("headphones")))
    );
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_top_and_categories() {
    let (status, body) = get_json("/api/products/top").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().expect("top products").len() <= 3);

    let (status, body) = get_json("/api/products/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.as_array()
            .expect("categories")
            .iter()
            .any(|c| c == "Electronics")
    );
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_product_detail_and_missing_product() {
    let product = product_in_stock(&client(), 1).await;
    let id = product["id"].as_i64().expect("product id");

    let (status, body) = get_json(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(id));
    assert!(body["reviews"].is_array());
    assert_eq!(body["reviewed"], false);

    let (status, body) = get_json("/api/products/999999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_quote_matches_public_pricing_rules() {
    let client = client();
    let product = product_in_stock(&client, 2).await;

    let (_, settings) = get_json("/api/settings/public").await;
    let policy: PricingPolicy =
        serde_json::from_value(settings["pricing"].clone()).expect("pricing policy");

    let resp = client
        .post(url("/api/cart/quote"))
        .json(&json!({ "items": [{ "productId": product["id"], "qty": 2 }] }))
        .send()
        .await
        .expect("Failed to quote");
    assert_eq!(resp.status(), StatusCode::OK);
    let quote: Value = resp.json().await.expect("Invalid quote");

    let line = &quote["lines"][0];
    assert_eq!(line["qty"], 2);
    let expected = policy.price([(money(&line["unitPrice"]), 2)]);
    assert_eq!(money(&quote["prices"]["total"]), expected.total);
    assert_eq!(money(&quote["prices"]["shipping"]), expected.shipping);
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_quote_clamps_to_stock_and_reports_missing() {
    let client = client();
    let product = product_in_stock(&client, 1).await;
    let stock = product["countInStock"].as_i64().expect("stock");

    let quote: Value = client
        .post(url("/api/cart/quote"))
        .json(&json!({
            "items": [
                { "productId": product["id"], "qty": stock + 50 },
                { "productId": 999_999_999, "qty": 1 },
            ]
        }))
        .send()
        .await
        .expect("Failed to quote")
        .json()
        .await
        .expect("Invalid quote");

    assert_eq!(quote["lines"][0]["qty"].as_i64(), Some(stock));
    assert_eq!(quote["lines"][0]["adjusted"], true);
    assert_eq!(quote["missing"], json!([999_999_999]));
}

#[tokio::test]
#[ignore = "Requires running API server with seeded catalog"]
async fn test_review_once_per_customer() {
    let client = client();
    let session = bazaar_integration_tests::register_customer(&client).await;
    let product = product_in_stock(&client, 0).await;
    let id = product["id"].as_i64().expect("product id");
    let review = json!({ "rating": 4, "comment": "Does what it says" });

    let resp = session
        .authorize(client.post(url(&format!("/api/products/{id}/reviews"))))
        .json(&review)
        .send()
        .await
        .expect("Failed to review");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let detail: Value = session
        .authorize(client.get(url(&format!("/api/products/{id}"))))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("Invalid product");
    assert_eq!(detail["reviewed"], true);

    let resp = session
        .authorize(client.post(url(&format!("/api/products/{id}/reviews"))))
        .json(&review)
        .send()
        .await
        .expect("Failed to review");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
