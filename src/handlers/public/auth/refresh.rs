// handlers/public/auth/refresh.rs - GET /refresh handler

use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::TokenKind;
use crate::error::ApiError;
use crate::handlers::context::Context;
use crate::middleware::response::{HandlerResult, Success};

#[derive(Debug, Deserialize)]
struct RefreshQuery {
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}

/// GET /refresh?refreshToken=... - trade a refresh token for a fresh pair
pub async fn refresh_get(ctx: Context) -> HandlerResult {
    let query: RefreshQuery = ctx.query_as()?;
    let token = query
        .refresh_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::bad_request("refreshToken is required"))?;

    let claims = ctx
        .state
        .tokens
        .verify_token(&token, TokenKind::Refresh)
        .map_err(|e| {
            warn!("Refresh rejected: {}", e);
            ApiError::from(e)
        })?;

    if !claims.is_refresh {
        warn!("Refresh rejected: access token presented for user {}", claims.data.id);
        return Err(ApiError::unauthorized("invalid refreshToken"));
    }

    debug!("Refreshing tokens for user {}", claims.data.id);
    let tokens = ctx.state.tokens.get_tokens(&claims.data)?;
    Ok(Success::from(tokens))
}
