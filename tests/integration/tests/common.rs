//! Common test utilities and fixtures.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use sparky_auth::StaticDirectory;
use sparky_core::Config;
use sparky_model::UserRole;
use sparky_server::{AppState, create_router};
use sparky_storage::InMemoryUserStore;
use tower::ServiceExt;

/// Configured memory admin.
pub const ADMIN: (&str, &str) = ("admin", "admin-password");

/// Directory account.
pub const DIRECTORY_USER: (&str, &str) = ("dora", "directory-password");

/// Response status, headers and JSON body (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Router plus direct access to the backing store.
pub struct TestEnv {
    pub router: Router,
    pub store: Arc<InMemoryUserStore>,
}

impl TestEnv {
    /// Creates an environment with a memory admin and one directory account.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(Config::for_testing())
    }

    /// Creates an environment from a custom configuration.
    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sparky_server=debug,sparky_auth=debug,audit=info")
            .with_test_writer()
            .try_init();

        let config = config.with_memory_user(ADMIN.0, ADMIN.1, UserRole::Admin);
        let store = Arc::new(InMemoryUserStore::new());
        let directory = StaticDirectory::new().with_account(
            DIRECTORY_USER.0,
            DIRECTORY_USER.1,
            &["ROLE_DEFAULT"],
        );
        let state = AppState::new(config, store.clone(), Some(Arc::new(directory)))?;

        Ok(Self {
            router: create_router(state),
            store,
        })
    }

    /// Sends a request with an optional bearer token and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.dispatch(request).await
    }

    /// Sends a prepared request.
    pub async fn dispatch(&self, request: Request<Body>) -> anyhow::Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(TestResponse { status, headers, body })
    }

    /// Logs in with JSON credentials and returns the token.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let response = self
            .send(
                Method::POST,
                "/api/v1/authenticate",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await?;
        anyhow::ensure!(
            response.status == StatusCode::OK,
            "login of {username} failed with {}: {}",
            response.status,
            response.body
        );
        response.body["token"]["token"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("login response without token"))
    }

    /// Logs in as the memory admin.
    pub async fn admin_token(&self) -> anyhow::Result<String> {
        self.login(ADMIN.0, ADMIN.1).await
    }

    /// Creates a local user through the API.
    pub async fn create_local_user(
        &self,
        username: &str,
        password: &str,
        role: Option<&str>,
    ) -> anyhow::Result<Value> {
        let admin = self.admin_token().await?;
        let mut body = serde_json::json!({ "username": username, "password": password });
        if let Some(role) = role {
            body["role"] = Value::from(role);
        }
        let response = self.send(Method::PUT, "/api/v1/users", Some(&admin), Some(body)).await?;
        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "creating {username} failed with {}: {}",
            response.status,
            response.body
        );
        Ok(response.body)
    }
}
