//! E2E tests for `POST /user/register`.
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use common::types::UserId;
use reqwest::StatusCode;
use serde_json::json;
use user_service::crypto::verify_password;
use user_service::repositories::UserStore;
use user_test_utils::{EnvelopeAssertions, TestUserServer, TokenAssertions, ALICE, BOB};

/// Happy path: the response is `{ "user": {id, username, email, token} }`.
#[tokio::test]
async fn test_register_happy_path() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .json(&ALICE.register_body())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    body.assert_no_password_fields();

    let user = &body["user"];
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");

    let id = user["id"].as_str().unwrap_or_default().to_string();
    user["token"]
        .as_str()
        .unwrap_or_default()
        .to_string()
        .assert_valid_jwt()
        .assert_for_subject(&id)
        .assert_for_username("alice")
        .assert_expires_in(60 * 86_400);

    Ok(())
}

/// The stored password is a bcrypt hash of the submitted one.
#[tokio::test]
async fn test_register_stores_hashed_password() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let user = server.register(&ALICE).await?;
    let id: UserId = user["id"].as_str().unwrap_or_default().parse()?;

    let stored = server
        .store()
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("registered user not in store"))?;
    assert_ne!(stored.password_hash, ALICE.password);
    assert!(verify_password(ALICE.password, &stored.password_hash)?);

    Ok(())
}

#[tokio::test]
async fn test_register_invalid_fields_lists_each() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .json(&json!({"username": "al", "email": "nope", "password": "short"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(422)
        .assert_field_error("username")
        .assert_field_error("email")
        .assert_field_error("password");
    assert!(server.store().is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    server.register(&ALICE).await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .json(&json!({
            "username": ALICE.username,
            "email": "another@example.com",
            "password": "password123"
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(422).assert_field_error("username");
    assert_eq!(server.store().len().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts_case_insensitively() -> Result<(), anyhow::Error>
{
    let server = TestUserServer::spawn().await?;
    server.register(&ALICE).await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .json(&json!({
            "username": "alice2",
            "email": "ALICE@EXAMPLE.COM",
            "password": "password123"
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_field_error("email");

    Ok(())
}

/// Parallel registrations of one username: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_register_concurrent_duplicates_single_winner() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let url = format!("{}/user/register", server.url());

    let requests = (0..6).map(|i| {
        let client = server.client().clone();
        let url = url.clone();
        async move {
            client
                .post(url)
                .json(&json!({
                    "username": "racer",
                    "email": format!("racer{}@example.com", i),
                    "password": "password123"
                }))
                .send()
                .await
                .map(|r| r.status())
        }
    });

    let statuses = futures::future::join_all(requests)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let created = statuses
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    let conflicts = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNPROCESSABLE_ENTITY)
        .count();
    assert_eq!(created, 1, "statuses: {:?}", statuses);
    assert_eq!(conflicts, 5, "statuses: {:?}", statuses);
    assert_eq!(server.store().len().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_register_emits_created_event() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let mut events = server.subscribe();

    let user = server.register(&BOB).await?;

    let event = events.recv().await?;
    assert_eq!(event.kind(), "created");
    assert_eq!(event.user().id.to_string(), user["id"].as_str().unwrap_or_default());
    assert!(event.user().token.is_none());

    Ok(())
}

#[tokio::test]
async fn test_register_malformed_json_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json")));
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(422).assert_field_error("body");
    assert!(server.store().is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_register_wrongly_typed_field_is_envelope() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .json(&json!({
            "username": 5,
            "email": "a@b.co",
            "password": "password123"
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(422).assert_field_error("body");

    Ok(())
}

#[tokio::test]
async fn test_register_form_encoded_body() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/register", server.url()))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("username=alice&email=alice%40example.com&password=password123")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"]["email"], "alice@example.com");

    Ok(())
}
