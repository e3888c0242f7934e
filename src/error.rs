use axum::{http::StatusCode, response::IntoResponse};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::TokenError;
use crate::database::StoreError;
use crate::middleware::response::Envelope;

/// Ways a handler can fail. Each one renders as an explicit envelope: the
/// status code plus `{ "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Storage or serialization failure; the raw message is passed through
    #[error("{0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message
    pub fn message(&self) -> &str {
        let (ApiError::BadRequest(message)
        | ApiError::Unauthorized(message)
        | ApiError::NotFound(message)
        | ApiError::InternalServerError(message)) = self;
        message
    }

    /// Body of the explicit envelope
    pub fn to_json(&self) -> Value {
        json!({ "message": self.message() })
    }
}

// Storage failures are unexpected: surface the raw message as a 500
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Record store error: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => {
                tracing::error!("Token signing error: {}", err);
                ApiError::internal_server_error(err.to_string())
            }
            TokenError::Expired(_) | TokenError::Invalid { .. } => ApiError::unauthorized(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        Envelope::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;

    #[test]
    fn token_errors_map_to_unauthorized_except_signing() {
        let expired: ApiError = TokenError::Expired(TokenKind::Access).into();
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.message(), "access token has expired");

        let signing: ApiError = TokenError::Signing("boom".into()).into();
        assert_eq!(signing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_keep_their_message() {
        let err: ApiError = StoreError::MissingId.into();
        assert_eq!(err, ApiError::internal_server_error("Record has no id"));
        assert_eq!(err.to_json(), json!({ "message": "Record has no id" }));
    }
}
