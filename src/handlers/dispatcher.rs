use axum::http::Method;
use std::sync::Arc;
use tracing::{debug, warn};

use super::context::{Context, IncomingRequest};
use super::registry::{normalize_path, HandlerRegistry};
use crate::error::ApiError;
use crate::middleware::response::{Envelope, HandlerResult};
use crate::state::AppState;

/// Lookup-and-invoke table. Holds no business logic of its own.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    registry: HandlerRegistry,
    state: AppState,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, state: AppState) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { registry, state }),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.inner.state
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Build the handler context for a parsed request
    pub fn context(&self, request: IncomingRequest) -> Context {
        Context::new(request, self.inner.state.clone(), self.clone())
    }

    /// Route a request and fold the outcome into an envelope
    pub async fn dispatch(&self, request: IncomingRequest) -> Envelope {
        let method = request.method.clone();
        let path = normalize_path(&request.path);
        debug!("Dispatching {} {}", method, path);

        let ctx = self.context(request);
        let result = self.invoke(&method, &path, ctx).await;

        if let Err(err) = &result {
            debug!("{} {} -> {} {}", method, path, err.status_code(), err.message());
        }
        Envelope::from(result)
    }

    pub(crate) async fn invoke(&self, method: &Method, path: &str, ctx: Context) -> HandlerResult {
        let Some(endpoint) = self.inner.registry.lookup(method, path) else {
            warn!("No handler registered for {} {}", method, path);
            return Err(ApiError::not_found(format!(
                "no handler for {} {}",
                method,
                normalize_path(path)
            )));
        };

        let handler = Arc::clone(endpoint.handler());
        handler(ctx).await
    }
}
