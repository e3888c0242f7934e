// handlers/public/auth/login.rs - POST /login handler

use serde::Deserialize;
use tracing::{info, warn};

use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::context::Context;
use crate::middleware::response::{HandlerResult, Success};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    name: Option<String>,
    password: Option<String>,
}

/// POST /login - exchange name and password for a token pair
///
/// Unknown names and wrong passwords get the same answer.
pub async fn login_post(ctx: Context) -> HandlerResult {
    let request: LoginRequest = ctx.data_as()?;
    let (Some(name), Some(password)) = (request.name, request.password) else {
        return Err(ApiError::bad_request("wrong username or password"));
    };

    let user = ctx
        .state
        .users()
        .select_one(|user: &User| user.name == name && user.password == password)
        .await?;

    let Some(user) = user else {
        warn!("Failed login for '{}'", name);
        return Err(ApiError::bad_request("wrong username or password"));
    };

    info!("User '{}' logged in", user.name);
    let tokens = ctx.state.tokens.get_tokens(&user.identity())?;
    Ok(Success::from(tokens))
}
