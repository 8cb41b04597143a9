//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real identity service instances in
//! tests, backed by an in-memory repository.

use crate::identity_builders::{test_config, TestUser};
use authn_service::config::Config;
use authn_service::handlers::auth_handler::AppState;
use authn_service::models::{IssuedToken, RegistrationSuccess};
use authn_service::repositories::InMemoryIdentityRepository;
use authn_service::routes;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const REGISTER_PATH: &str = "/api/v1/legacy/register";
pub const ACTIVATE_PATH: &str = "/api/v1/legacy/activate";
pub const LOGIN_PATH: &str = "/api/v1/legacy/login";

/// Test harness for spawning the identity service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register_e2e() -> Result<()> {
///     let server = TestAuthServer::spawn().await?;
///
///     let response = server
///         .post_json(REGISTER_PATH, &bob().registration_body())
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    repo: Arc<InMemoryIdentityRepository>,
    config: Config,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server with the default test configuration and an empty
    /// repository
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(test_config(), Arc::new(InMemoryIdentityRepository::new())).await
    }

    /// Spawn a server with explicit configuration and repository
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        config: Config,
        repo: Arc<InMemoryIdentityRepository>,
    ) -> Result<Self, anyhow::Error> {
        let state = Arc::new(AppState {
            repo: repo.clone(),
            config: config.clone(),
        });

        // Initialize metrics recorder for test server
        // Note: This may fail if already installed in the test process.
        // In that case, we create a new recorder without installing it globally.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            repo,
            config,
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

    /// Get the repository behind the server, for seeding and inspection
    pub fn repo(&self) -> &InMemoryIdentityRepository {
        &self.repo
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .get(format!("{}{}", self.url(), path))
            .send()
            .await?)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await?)
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .put(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Register `user` and return the activation details
    pub async fn register(&self, user: &TestUser) -> Result<RegistrationSuccess, anyhow::Error> {
        let response = self
            .post_json(REGISTER_PATH, &user.registration_body())
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Registration failed with {}: {}", status, response.text().await?);
        }
        Ok(response.json().await?)
    }

    /// Register, activate, then log in by username with the default lifetime
    ///
    /// # Example
    /// ```rust,ignore
    /// let issued = server.register_activate_and_login(&bob()).await?;
    /// issued.token.assert_for_subject("bobsmith");
    /// ```
    pub async fn register_activate_and_login(
        &self,
        user: &TestUser,
    ) -> Result<IssuedToken, anyhow::Error> {
        let registered = self.register(user).await?;

        let response = self
            .put_json(ACTIVATE_PATH, &user.activation_body(registered.activation_code))
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Activation failed with {}: {}", status, response.text().await?);
        }

        let response = self
            .post_json(LOGIN_PATH, &user.login_by_username(None))
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Login failed with {}: {}", status, response.text().await?);
        }
        Ok(response.json().await?)
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
