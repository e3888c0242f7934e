// handlers/public/auth/register.rs - POST /register handler

use serde::Deserialize;
use tracing::{info, warn};

use crate::database::models::{NewUser, User};
use crate::error::ApiError;
use crate::handlers::context::Context;
use crate::middleware::response::{HandlerResult, Success};
use crate::types::Permission;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    password: String,
    #[serde(default)]
    permission: Permission,
}

/// POST /register - create an account and log it in
///
/// The name check and the insert happen as one store operation, so two
/// concurrent registrations of the same name leave exactly one user.
pub async fn register_post(ctx: Context) -> HandlerResult {
    let request: RegisterRequest = ctx.data_as()?;

    let new_user = NewUser {
        name: request.name.clone(),
        password: request.password,
        permission: request.permission,
        is_deleted: false,
    };

    let name = request.name;
    let created = ctx
        .state
        .users()
        .insert_unless(&new_user, move |user: &User| user.name == name)
        .await?;

    let Some(user) = created else {
        warn!("Registration rejected, name '{}' is taken", new_user.name);
        return Err(ApiError::bad_request("username already exists"));
    };

    info!("Registered user '{}' ({})", user.name, user.id);
    let tokens = ctx.state.tokens.get_tokens(&user.identity())?;
    Ok(Success::from(tokens))
}
