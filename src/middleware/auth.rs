use axum::http::HeaderMap;
use futures::future::FutureExt;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use crate::auth::{Claims, Identity, TokenKind};
use crate::error::ApiError;
use crate::handlers::context::Context;
use crate::handlers::registry::{Endpoint, Handler};
use crate::middleware::response::HandlerResult;

/// Context of an authenticated request: the request context plus the
/// decoded access token.
pub struct AuthContext {
    pub ctx: Context,
    pub token_data: Claims,
}

impl AuthContext {
    pub fn identity(&self) -> &Identity {
        &self.token_data.data
    }
}

impl Deref for AuthContext {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

/// Wrap `handler` so it only runs with a valid access token.
///
/// Failures short-circuit with a 401 carrying the verification message.
/// `paginated` is recorded on the endpoint; nothing here validates it.
pub fn require_auth<F, Fut>(handler: F, paginated: bool) -> Endpoint
where
    F: Fn(AuthContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let handler = Arc::new(handler);
    let wrapped: Handler = Arc::new(move |ctx: Context| {
        let handler = Arc::clone(&handler);
        async move {
            let token_data = authenticate(&ctx)?;
            (*handler)(AuthContext { ctx, token_data }).await
        }
        .boxed()
    });

    Endpoint::from_handler(wrapped, true, paginated)
}

/// Verify the bearer token of a request as an access token
pub fn authenticate(ctx: &Context) -> Result<Claims, ApiError> {
    let token = extract_token_from_headers(&ctx.headers).map_err(|msg| {
        tracing::warn!("Rejected {} {}: {}", ctx.method, ctx.path, msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = ctx
        .state
        .tokens
        .verify_token(&token, TokenKind::Access)
        .map_err(|e| {
            tracing::warn!("Rejected {} {}: {}", ctx.method, ctx.path, e);
            ApiError::from(e)
        })?;

    if claims.is_refresh {
        tracing::warn!("Rejected {} {}: refresh token used as access token", ctx.method, ctx.path);
        return Err(ApiError::unauthorized("refresh token cannot be used as an access token"));
    }

    Ok(claims)
}

/// Extract token from the Authorization header
fn extract_token_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty access token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
