//! E2E tests for `PUT /user/update`.

use reqwest::StatusCode;
use serde_json::json;
use user_test_utils::{EnvelopeAssertions, TestUserServer, ALICE, BOB};

#[tokio::test]
async fn test_update_requires_authentication() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .json(&json!({"username": "mallory"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_update_username_keeps_presented_token() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"username": "alicia"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    body.assert_no_password_fields();
    assert_eq!(body["user"]["username"], "alicia");
    assert_eq!(body["user"]["email"], ALICE.email);
    assert_eq!(body["user"]["token"], token.as_str());

    Ok(())
}

#[tokio::test]
async fn test_update_email_to_other_users_conflicts() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;
    server.register(&BOB).await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"email": BOB.email}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(422).assert_field_error("email");

    Ok(())
}

#[tokio::test]
async fn test_update_email_to_own_succeeds() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"email": ALICE.email}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

/// After a password change only the new password logs in.
#[tokio::test]
async fn test_update_password_changes_login() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"password": "brand-new-password"}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let old = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&ALICE.login_body())
        .send()
        .await?;
    assert_eq!(old.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let new = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&json!({"email": ALICE.email, "password": "brand-new-password"}))
        .send()
        .await?;
    assert_eq!(new.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_update_invalid_value_is_validation_error() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"username": "x"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_field_error("username");

    Ok(())
}

#[tokio::test]
async fn test_update_emits_updated_event() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;
    let mut events = server.subscribe();

    server
        .client()
        .put(format!("{}/user/update", server.url()))
        .bearer_auth(&token)
        .json(&json!({"username": "alicia"}))
        .send()
        .await?;

    let event = events.recv().await?;
    assert_eq!(event.kind(), "updated");
    assert_eq!(event.user().username, "alicia");

    Ok(())
}
