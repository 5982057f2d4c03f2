//! Test server harness for E2E testing
//!
//! Provides `TestUserServer` for spawning real user-service instances on an
//! ephemeral port, backed by the in-memory store.

use crate::fixtures::{test_config, TestUser};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use user_service::config::Config;
use user_service::models::UserEvent;
use user_service::repositories::{InMemoryUserStore, UserStore};
use user_service::routes::{self, AppState};

/// Test harness for spawning the user service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register_e2e() -> Result<(), anyhow::Error> {
///     let server = TestUserServer::spawn().await?;
///
///     let response = server
///         .client()
///         .post(format!("{}/user/register", server.url()))
///         .json(&ALICE.register_body())
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 201);
///     Ok(())
/// }
/// ```
pub struct TestUserServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    store: Arc<InMemoryUserStore>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestUserServer {
    /// Spawn with [`test_config`].
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(test_config()).await
    }

    /// Spawn a new test server instance with its own empty store
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Use an isolated `InMemoryUserStore`
    /// - Start the HTTP server in the background
    pub async fn spawn_with(config: Config) -> Result<Self, anyhow::Error> {
        let store = Arc::new(InMemoryUserStore::new());
        let state = Arc::new(AppState::new(
            config,
            store.clone() as Arc<dyn UserStore>,
        ));

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state.clone(), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test server")?;
        let addr = listener
            .local_addr()
            .context("Failed to get local address")?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            store,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Shared application state, including the token cache.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The server's backing store, for direct inspection.
    pub fn store(&self) -> &InMemoryUserStore {
        &self.store
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Receive Created/Updated events from this server.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<UserEvent> {
        self.state.events.subscribe()
    }

    /// Register `user` and return the `user` object of the response.
    pub async fn register(&self, user: &TestUser) -> Result<serde_json::Value, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/user/register", self.url()))
            .json(&user.register_body())
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::CREATED,
            "registration of {} failed with {}",
            user.username,
            response.status()
        );
        let body: serde_json::Value = response.json().await?;
        Ok(body["user"].clone())
    }

    /// Register `user` and return its token.
    pub async fn register_token(&self, user: &TestUser) -> Result<String, anyhow::Error> {
        let view = self.register(user).await?;
        view["token"]
            .as_str()
            .map(str::to_string)
            .context("registration response carried no token")
    }
}

impl Drop for TestUserServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
