//! E2E tests for `POST /user/login` and the `POST /login` alias.

use reqwest::StatusCode;
use serde_json::json;
use user_test_utils::{EnvelopeAssertions, TestUserServer, TokenAssertions, ALICE};

#[tokio::test]
async fn test_login_happy_path_returns_fresh_token() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let registered = server.register(&ALICE).await?;

    let response = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&ALICE.login_body())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    body.assert_no_password_fields();
    assert_eq!(body["user"]["id"], registered["id"]);
    body["user"]["token"]
        .as_str()
        .unwrap_or_default()
        .to_string()
        .assert_valid_jwt()
        .assert_for_username("alice");

    Ok(())
}

#[tokio::test]
async fn test_login_alias_route() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    server.register(&ALICE).await?;

    let response = server
        .client()
        .post(format!("{}/login", server.url()))
        .json(&ALICE.login_body())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

/// Unknown email and wrong password are indistinguishable.
#[tokio::test]
async fn test_login_failures_are_identical() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    server.register(&ALICE).await?;

    let wrong_password = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&json!({"email": ALICE.email, "password": "wrong-password"}))
        .send()
        .await?;
    let unknown_email = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&json!({"email": "nobody@example.com", "password": ALICE.password}))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown_email.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong_password: serde_json::Value = wrong_password.json().await?;
    let unknown_email: serde_json::Value = unknown_email.json().await?;
    wrong_password.assert_error_status(422);
    assert_eq!(wrong_password, unknown_email);

    Ok(())
}

#[tokio::test]
async fn test_login_missing_fields_is_validation_error() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .json(&json!({"email": ALICE.email}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    body.assert_field_error("password");

    Ok(())
}

#[tokio::test]
async fn test_login_form_encoded_body() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    server.register(&ALICE).await?;

    let response = server
        .client()
        .post(format!("{}/user/login", server.url()))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("email=alice%40example.com&password=alice-password-1")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"]["username"], "alice");

    Ok(())
}
