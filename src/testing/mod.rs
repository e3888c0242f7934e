use axum::http::Method;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::MemoryStore;
use crate::handlers::context::IncomingRequest;
use crate::handlers::dispatcher::Dispatcher;
use crate::handlers::mock_routes;
use crate::middleware::response::Envelope;
use crate::state::AppState;

/// Fresh state over an empty in-memory store with development settings
pub fn test_state() -> AppState {
    let config = AppConfig::development();
    AppState::new(
        Arc::new(MemoryStore::new()),
        TokenService::from_config(&config.security),
        config.captcha,
    )
}

/// Test utilities for driving the mock routes without a transport
pub struct TestContext {
    pub dispatcher: Dispatcher,
}

/// Tokens of a user created through `register`
#[derive(Debug, Clone)]
pub struct TestUser {
    pub name: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(mock_routes(), test_state()),
        }
    }

    pub fn state(&self) -> &AppState {
        self.dispatcher.state()
    }

    pub async fn get(&self, path: &str, query: Value, token: Option<&str>) -> Envelope {
        let mut request = IncomingRequest::new(Method::GET, path).query(query);
        if let Some(token) = token {
            request = request.bearer(token);
        }
        self.dispatcher.dispatch(request).await
    }

    pub async fn post(&self, path: &str, data: Value, token: Option<&str>) -> Envelope {
        let mut request = IncomingRequest::new(Method::POST, path).json(data);
        if let Some(token) = token {
            request = request.bearer(token);
        }
        self.dispatcher.dispatch(request).await
    }

    /// Register `name` and return its token pair; panics if registration fails
    pub async fn register_user(&self, name: &str, password: &str) -> TestUser {
        let envelope = self
            .post("register", json!({ "name": name, "password": password }), None)
            .await;
        let body = envelope.body();
        assert_eq!(body["success"], true, "register failed: {}", body);

        TestUser {
            name: name.to_string(),
            access_token: body["accessToken"].as_str().unwrap_or_default().to_string(),
            refresh_token: body["refreshToken"].as_str().unwrap_or_default().to_string(),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
