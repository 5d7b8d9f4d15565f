//! End-to-end tests for the auth endpoints and rate limiting.

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_register_login_logout_round_trip() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    let client = reqwest::Client::new();

    // Register
    let res = client
        .post(gateway.url("/api/auth/register"))
        .json(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["x-ratelimit-limit"], "5");
    assert_eq!(res.headers()["x-ratelimit-remaining"], "4");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["userId"].is_string());

    // Login
    let res = client
        .post(gateway.url("/api/auth/login"))
        .json(&json!({
            "email": "ada@example.com",
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "3");
    let body: Value = res.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Logout
    let res = client
        .post(gateway.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));

    // Token is dead now.
    let res = client
        .post(gateway.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_rate_limit_rejects_sixth_attempt() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    let client = reqwest::Client::new();

    // Five failed logins burn the whole window quota for this caller.
    for _ in 0..5 {
        let res = client
            .post(gateway.url("/api/auth/login"))
            .header("x-forwarded-for", "203.0.113.9")
            .json(&json!({ "email": "ghost@example.com", "password": "wrong-pass" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
    }

    let res = client
        .post(gateway.url("/api/auth/login"))
        .header("x-forwarded-for", "203.0.113.9")
        .json(&json!({ "email": "ghost@example.com", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    assert!(res.headers().contains_key("retry-after"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"],
        json!("Too many requests. Please try again later.")
    );

    // A different caller is unaffected.
    let res = client
        .post(gateway.url("/api/auth/login"))
        .header("x-forwarded-for", "198.51.100.7")
        .json(&json!({ "email": "ghost@example.com", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // The rejection left a SECURITY entry behind.
    let security: Vec<_> = gateway
        .log
        .recent(1000, None)
        .into_iter()
        .filter(|e| e.context.as_deref() == Some("SECURITY"))
        .collect();
    assert!(security
        .iter()
        .any(|e| e.message == "SECURITY: RATE_LIMIT_EXCEEDED"));
}

#[tokio::test]
async fn test_validation_errors_are_400s() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(gateway.url("/api/auth/register"))
        .json(&json!({ "name": "Ada", "email": "not-an-email", "password": "long enough" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .post(gateway.url("/api/auth/register"))
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    let client = reqwest::Client::new();

    let payload = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "correct horse battery",
    });
    let res = client
        .post(gateway.url("/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let res = client
        .post(gateway.url("/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);
}
