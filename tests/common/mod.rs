#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use mock_bill_api::auth::TokenService;
use mock_bill_api::config::AppConfig;
use mock_bill_api::database::MemoryStore;
use mock_bill_api::handlers::dispatcher::Dispatcher;
use mock_bill_api::handlers::mock_routes;
use mock_bill_api::server;
use mock_bill_api::state::AppState;

/// In-process server over a fresh in-memory store, one per test
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::development();
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            TokenService::from_config(&config.security),
            config.captcha.clone(),
        );
        let router = server::app(Dispatcher::new(mock_routes(), state.clone()), &config.server);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// URL of a mock route under the default `/api` prefix
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.post(self.api(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)], token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.get(self.api(path)).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;
        Ok((res.status(), res.json().await?))
    }

    /// Register and return `(accessToken, refreshToken)`
    pub async fn register(&self, name: &str, password: &str) -> Result<(String, String)> {
        let (status, body) = self
            .post("register", json!({ "name": name, "password": password }), None)
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "register failed: {} {}", status, body);
        Ok((
            body["accessToken"].as_str().context("no accessToken")?.to_string(),
            body["refreshToken"].as_str().context("no refreshToken")?.to_string(),
        ))
    }
}
