use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value};

use crate::auth::TokenPair;
use crate::error::ApiError;

/// Handler-specific fields of a successful response. Rendered flat next to
/// `"success": true`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Success {
    fields: Map<String, Value>,
}

impl Success {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<TokenPair> for Success {
    fn from(tokens: TokenPair) -> Self {
        Success::new()
            .with("accessToken", tokens.access_token)
            .with("refreshToken", tokens.refresh_token)
    }
}

/// What every handler returns
pub type HandlerResult = Result<Success, ApiError>;

/// The two response shapes the transport knows how to emit
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// 200 with `{ "success": true, ...fields }`
    Success(Map<String, Value>),
    /// Given status with `data` as the body, verbatim
    Explicit { status: StatusCode, data: Value },
}

impl Envelope {
    pub fn status(&self) -> StatusCode {
        match self {
            Envelope::Success(_) => StatusCode::OK,
            Envelope::Explicit { status, .. } => *status,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Envelope::Success(fields) => {
                let mut body = Map::with_capacity(fields.len() + 1);
                body.insert("success".to_string(), Value::Bool(true));
                for (key, value) in fields {
                    body.insert(key.clone(), value.clone());
                }
                Value::Object(body)
            }
            Envelope::Explicit { data, .. } => data.clone(),
        }
    }
}

impl From<Success> for Envelope {
    fn from(success: Success) -> Self {
        Envelope::Success(success.into_fields())
    }
}

impl From<ApiError> for Envelope {
    fn from(err: ApiError) -> Self {
        Envelope::Explicit {
            status: err.status_code(),
            data: err.to_json(),
        }
    }
}

impl From<HandlerResult> for Envelope {
    fn from(result: HandlerResult) -> Self {
        match result {
            Ok(success) => success.into(),
            Err(err) => err.into(),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_renders_flat_with_flag() {
        let envelope = Envelope::from(Success::new().with("captchaId", "abc").with("captcha", "123456"));
        assert_eq!(envelope.status(), StatusCode::OK);
        assert_eq!(
            envelope.body(),
            json!({ "success": true, "captchaId": "abc", "captcha": "123456" })
        );
    }

    #[test]
    fn errors_render_explicit_message_body() {
        let result: HandlerResult = Err(ApiError::bad_request("phone is required"));
        let envelope = Envelope::from(result);
        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.body(), json!({ "message": "phone is required" }));
    }

    #[test]
    fn token_pair_becomes_flat_fields() {
        let success = Success::from(TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        });
        assert_eq!(success.get("accessToken"), Some(&json!("a")));
        assert_eq!(success.get("refreshToken"), Some(&json!("r")));
    }
}
