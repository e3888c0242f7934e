// handlers/protected/user.rs - GET /getUserInfo and GET /test handlers

use serde_json::json;

use crate::api::format::{format_entity, DtoKind};
use crate::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::middleware::response::{HandlerResult, Success};

/// GET /getUserInfo - profile of the token's user
///
/// The view is shaped with the user's own stored permission.
pub async fn user_info_get(auth: AuthContext) -> HandlerResult {
    let user = auth
        .state
        .users()
        .select_id(&auth.identity().id)
        .await?
        .ok_or_else(|| ApiError::bad_request("user does not exist"))?;

    if user.is_deleted {
        return Err(ApiError::bad_request("user has been deleted"));
    }

    let user_info = format_entity(DtoKind::User, &user, user.permission)?;
    Ok(Success::new().with("data", json!({ "userInfo": user_info })))
}

/// GET /test - echo the identity carried by the access token
pub async fn token_info_get(auth: AuthContext) -> HandlerResult {
    let identity = auth.identity();
    Ok(Success::new()
        .with("id", identity.id.clone())
        .with("permission", identity.permission.0))
}
