use anyhow::{bail, Context as _};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::TokenService;
use crate::config::{AppConfig, ServerConfig, StoreBackend, DEV_JWT_SECRET};
use crate::database::{MemoryStore, PgStore, RecordStore, StoreError};
use crate::error::ApiError;
use crate::handlers::context::IncomingRequest;
use crate::handlers::dispatcher::Dispatcher;
use crate::handlers::mock_routes;
use crate::middleware::response::Envelope;
use crate::services::SessionSweeper;
use crate::state::AppState;

#[derive(Clone)]
struct HttpState {
    dispatcher: Dispatcher,
    prefix: String,
}

/// `/api/` and `api` both mean `/api`; empty means no prefix
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Handler path for a request path, or None when it is outside the prefix
fn logical_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Query string as a JSON object of strings. Repeated keys keep the last value.
fn parse_query(uri: &Uri) -> Value {
    let mut query = Map::new();
    if let Some(raw) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    Value::Object(query)
}

/// Request body as JSON; an empty body reads as `{}`
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))
}

/// Catch-all: turn the HTTP request into an `IncomingRequest` and dispatch it
async fn dispatch_http(
    State(http): State<HttpState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Envelope {
    let Some(path) = logical_path(uri.path(), &http.prefix) else {
        return ApiError::not_found(format!("no handler for {} {}", method, uri.path())).into();
    };

    let data = match parse_body(&body) {
        Ok(data) => data,
        Err(e) => return e.into(),
    };

    let request = IncomingRequest::new(method, path)
        .with_uri(uri.clone())
        .headers(headers)
        .json(data)
        .query(parse_query(&uri));

    http.dispatcher.dispatch(request).await
}

async fn root(State(http): State<HttpState>) -> Json<Value> {
    let routes: Vec<Value> = http
        .dispatcher
        .registry()
        .routes()
        .into_iter()
        .map(|route| {
            json!({
                "method": route.method,
                "path": format!("{}/{}", http.prefix, route.path),
                "auth": route.auth,
                "paginated": route.paginated,
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "routes": routes,
        }
    }))
}

async fn health(State(http): State<HttpState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match http.dispatcher.state().store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}

/// HTTP router around a dispatcher. Holds no business logic.
pub fn app(dispatcher: Dispatcher, server: &ServerConfig) -> Router {
    let http = HttpState {
        dispatcher,
        prefix: normalize_prefix(&server.route_prefix),
    };

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .fallback(dispatch_http)
        .with_state(http);

    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

/// Open the configured record store
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
            let store = PgStore::connect(url, config.store.max_connections).await?;
            info!("Using PostgreSQL record store");
            Ok(Arc::new(store))
        }
    }
}

/// Services shared by all handlers, built from config
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = open_store(config).await.context("failed to open record store")?;
    Ok(AppState::new(
        store,
        TokenService::from_config(&config.security),
        config.captcha.clone(),
    ))
}

/// Run the mock server until ctrl-c
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    if crate::is_production!() && config.security.jwt_secret == DEV_JWT_SECRET {
        bail!("JWT_SECRET must be set in production");
    }

    let state = build_state(config).await?;

    let sweeper = (config.captcha.sweep_interval_secs > 0).then(|| {
        SessionSweeper::new(state.sessions())
            .start_scheduled(Duration::from_secs(config.captcha.sweep_interval_secs))
    });

    let dispatcher = Dispatcher::new(mock_routes(), state);
    let router = app(dispatcher, &config.server);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!(
        "Mock bill API listening on http://{}{}",
        bind_addr,
        normalize_prefix(&config.server.route_prefix)
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Request};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let dispatcher = Dispatcher::new(mock_routes(), testing::test_state());
        app(dispatcher, &AppConfig::development().server)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn prefixes_are_matched_on_segment_boundaries() {
        assert_eq!(normalize_prefix("api/"), "/api");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(logical_path("/api/bill/list", "/api"), Some("/bill/list"));
        assert_eq!(logical_path("/api", "/api"), Some(""));
        assert_eq!(logical_path("/apix/login", "/api"), None);
        assert_eq!(logical_path("/login", ""), Some("/login"));
    }

    #[test]
    fn query_values_are_strings() {
        let uri: Uri = "/api/bill/list?current=2&pageSize=10&name=a%20b".parse().unwrap();
        assert_eq!(
            parse_query(&uri),
            json!({ "current": "2", "pageSize": "10", "name": "a b" })
        );
    }

    #[tokio::test]
    async fn register_over_http_returns_tokens() {
        let (status, body) = send(
            test_app(),
            post_json("/api/register", json!({ "name": "amy", "password": "pw" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["accessToken"].is_string());
    }

    #[tokio::test]
    async fn explicit_errors_keep_their_status_and_body() {
        let (status, body) = send(
            test_app(),
            Request::get("/api/captcha").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "phone is required" }));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::post("/api/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(test_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("invalid JSON body"));
    }

    #[tokio::test]
    async fn paths_outside_the_prefix_are_404() {
        let (status, _) = send(
            test_app(),
            Request::get("/captcha?phone=1").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn root_lists_routes_and_health_pings_the_store() {
        let (status, body) = send(test_app(), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let routes = body["data"]["routes"].as_array().unwrap();
        assert_eq!(routes.len(), 9);
        assert!(routes.iter().any(|r| r["path"] == "/api/bill/list" && r["paginated"] == true));

        let (status, body) = send(test_app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["store"], "ok");
    }
}
