//! E2E tests for the authorization interceptor and session routes:
//! `/user/me`, `/user/status`, `/user/logout`, `/logout`.

use reqwest::StatusCode;
use user_test_utils::{
    EnvelopeAssertions, TestTokenBuilder, TestUserServer, ALICE, FOREIGN_JWT_SECRET,
};

#[tokio::test]
async fn test_me_without_authorization_is_401() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = reqwest::get(format!("{}/user/me", server.url())).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(401);

    Ok(())
}

#[tokio::test]
async fn test_me_with_bearer_token_returns_own_view() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .get(format!("{}/user/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    body.assert_no_password_fields();
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["token"], token.as_str());

    Ok(())
}

#[tokio::test]
async fn test_me_accepts_token_scheme() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let response = server
        .client()
        .get(format!("{}/user/me", server.url()))
        .header("Authorization", format!("Token {}", token))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_me_with_expired_token_is_401() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let user = server.register(&ALICE).await?;
    let id = user["id"].as_str().unwrap_or_default().parse()?;

    let expired = TestTokenBuilder::new()
        .for_user(id)
        .with_username("alice")
        .expired(60)
        .build();

    let response = server
        .client()
        .get(format!("{}/user/me", server.url()))
        .bearer_auth(expired)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_me_with_foreign_signature_is_401() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let user = server.register(&ALICE).await?;
    let id = user["id"].as_str().unwrap_or_default().parse()?;

    let forged = TestTokenBuilder::new()
        .for_user(id)
        .with_username("alice")
        .signed_with(FOREIGN_JWT_SECRET)
        .build();

    let response = server
        .client()
        .get(format!("{}/user/me", server.url()))
        .bearer_auth(forged)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

/// A validly signed token for an id with no record.
#[tokio::test]
async fn test_me_for_missing_record_is_404() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let ghost = TestTokenBuilder::new().build();

    let response = server
        .client()
        .get(format!("{}/user/me", server.url()))
        .bearer_auth(ghost)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await?;
    body.assert_error_status(404);
    Ok(())
}

#[tokio::test]
async fn test_status_anonymous_and_authenticated() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;

    let anonymous: serde_json::Value = reqwest::get(format!("{}/user/status", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(anonymous["authenticated"], false);
    assert!(anonymous.get("user").is_none());

    let response = server
        .client()
        .get(format!("{}/user/status", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let signed_in: serde_json::Value = response.json().await?;
    assert_eq!(signed_in["authenticated"], true);
    assert_eq!(signed_in["user"]["username"], "alice");

    Ok(())
}

/// Logout evicts the cache entry; the stateless token stays valid.
#[tokio::test]
async fn test_logout_evicts_cache_entry() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;
    let token = server.register_token(&ALICE).await?;
    let cache = server.state().cache.clone();

    server
        .client()
        .get(format!("{}/user/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(cache.len().await, 1);

    let response = server
        .client()
        .get(format!("{}/user/logout", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "logged_out");
    assert!(cache.is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_logout_alias_without_credentials() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = reqwest::get(format!("{}/logout", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
