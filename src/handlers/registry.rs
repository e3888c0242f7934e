use axum::http::Method;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use super::context::Context;
use crate::middleware::response::HandlerResult;

/// Type-erased async handler
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A handler plus the metadata it was registered with
#[derive(Clone)]
pub struct Endpoint {
    handler: Handler,
    pub auth: bool,
    /// Query carries `current` / `pageSize`
    pub paginated: bool,
}

impl Endpoint {
    /// Endpoint reachable without a token
    pub fn public<F, Fut>(handler: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |ctx: Context| handler(ctx).boxed()),
            auth: false,
            paginated: false,
        }
    }

    pub(crate) fn from_handler(handler: Handler, auth: bool, paginated: bool) -> Self {
        Self {
            handler,
            auth,
            paginated,
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Public description of one registered route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub auth: bool,
    pub paginated: bool,
}

/// Verb + logical path → endpoint
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    routes: BTreeMap<(String, String), Endpoint>,
}

/// Strip surrounding slashes so `/bill/list/` and `bill/list` are the same key
pub fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, path: &str, endpoint: Endpoint) -> Self {
        self.routes
            .insert((method.as_str().to_string(), normalize_path(path)), endpoint);
        self
    }

    pub fn get(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(Method::GET, path, endpoint)
    }

    pub fn post(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(Method::POST, path, endpoint)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Endpoint> {
        self.routes
            .get(&(method.as_str().to_string(), normalize_path(path)))
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|((method, path), endpoint)| RouteInfo {
                method: method.clone(),
                path: path.clone(),
                auth: endpoint.auth,
                paginated: endpoint.paginated,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
