use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::dispatcher::Dispatcher;
use super::registry::normalize_path;
use crate::error::ApiError;
use crate::middleware::response::HandlerResult;
use crate::state::AppState;

/// A parsed request as handed over by the transport
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    /// Logical handler path, e.g. `bill/list`
    pub path: String,
    pub headers: HeaderMap,
    /// Parsed JSON body, `{}` when there was none
    pub data: Value,
    /// Query parameters as a JSON object of strings
    pub query: Value,
}

impl IncomingRequest {
    pub fn new(method: Method, path: &str) -> Self {
        let path = normalize_path(path);
        let uri = format!("/{}", path).parse().unwrap_or_default();
        Self {
            method,
            uri,
            path,
            headers: HeaderMap::new(),
            data: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
        }
    }

    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    pub fn json(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => self.header(AUTHORIZATION, value),
            Err(_) => self,
        }
    }
}

/// Everything a handler gets to look at for one request
#[derive(Clone)]
pub struct Context {
    pub uri: Uri,
    pub method: Method,
    pub path: String,
    pub data: Value,
    pub query: Value,
    pub headers: HeaderMap,
    pub state: AppState,
    dispatcher: Dispatcher,
}

impl Context {
    pub(crate) fn new(request: IncomingRequest, state: AppState, dispatcher: Dispatcher) -> Self {
        Self {
            uri: request.uri,
            method: request.method,
            path: request.path,
            data: request.data,
            query: request.query,
            headers: request.headers,
            state,
            dispatcher,
        }
    }

    /// Deserialize the request body; shape mismatches are the caller's fault (400)
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e)))
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.query.clone())
            .map_err(|e| ApiError::bad_request(format!("invalid query: {}", e)))
    }

    /// Invoke another registered handler, bypassing the transport
    pub async fn call(&self, method: Method, path: &str, ctx: Context) -> HandlerResult {
        self.dispatcher.invoke(&method, path, ctx).await
    }
}
