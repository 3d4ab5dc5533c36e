//! Integration tests for registration, login, profile, and logout.
//!
//! These tests require a running API with migrations applied.
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

#![allow(clippy::expect_used)]

use bazaar_integration_tests::{client, register_customer, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health() {
    let resp = client()
        .get(url("/health"))
        .send()
        .await
        .expect("Failed to reach /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client()
        .get(url("/health/ready"))
        .send()
        .await
        .expect("Failed to reach /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_register_then_login() {
    let client = client();
    let session = register_customer(&client).await;
    assert!(!session.is_admin);

    let resp = client
        .post(url("/api/users/login"))
        .json(&json!({ "email": session.email, "password": "integration-pass-1" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Invalid login response");
    assert_eq!(body["id"].as_i64(), Some(session.id));
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_duplicate_registration_conflicts() {
    let client = client();
    let session = register_customer(&client).await;

    let resp = client
        .post(url("/api/users"))
        .json(&json!({
            "name": "Someone Else",
            "email": session.email.to_uppercase(),
            "password": "another-pass-1",
        }))
        .send()
        .await
        .expect("Failed to send duplicate registration");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_wrong_password_is_unauthorized() {
    let client = client();
    let session = register_customer(&client).await;

    let resp = client
        .post(url("/api/users/login"))
        .json(&json!({ "email": session.email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.expect("Invalid error body");
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_profile_update() {
    let client = client();
    let session = register_customer(&client).await;

    let resp = session
        .authorize(client.put(url("/api/users/profile")))
        .json(&json!({ "name": "Renamed Tester" }))
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = session
        .authorize(client.get(url("/api/users/profile")))
        .send()
        .await
        .expect("Failed to fetch profile")
        .json()
        .await
        .expect("Invalid profile");
    assert_eq!(body["name"], "Renamed Tester");
    assert_eq!(body["email"], session.email);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_logout_revokes_token() {
    let client = client();
    let session = register_customer(&client).await;

    let resp = session
        .authorize(client.post(url("/api/users/logout")))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = session
        .authorize(client.get(url("/api/users/profile")))
        .send()
        .await
        .expect("Failed to fetch profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.expect("Invalid error body");
    assert_eq!(body["error"], "Not authorized, token revoked");
}
