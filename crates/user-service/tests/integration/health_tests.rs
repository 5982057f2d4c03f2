//! E2E tests for operational endpoints.

use reqwest::StatusCode;
use user_test_utils::server_harness::TestUserServer;

#[tokio::test]
async fn test_health_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

/// The original action-style health route is still answered.
#[tokio::test]
async fn test_user_health_alias_accepts_post() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/user/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_ready_reports_store_kind() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"], "memory");
    assert!(body.get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestUserServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
