// handlers/mod.rs - Two-tier handler layout
//
// Public (no token) → Protected (access token, wrapped with `require_auth`).
// Handlers never see HTTP types; the transport turns a request into a
// `Context` and the dispatcher picks the handler by verb and path.

pub mod context;
pub mod dispatcher;
pub mod registry;

pub mod protected; // Tier 2: access token required
pub mod public; // Tier 1: no authentication required

use crate::middleware::auth::require_auth;
use registry::{Endpoint, HandlerRegistry};

/// Every route the mock server answers, relative to the configured prefix
pub fn mock_routes() -> HandlerRegistry {
    HandlerRegistry::new()
        // Public
        .post("register", Endpoint::public(public::register_post))
        .post("login", Endpoint::public(public::login_post))
        .post("checkCaptcha", Endpoint::public(public::check_captcha_post))
        .get("captcha", Endpoint::public(public::captcha_get))
        .get("refresh", Endpoint::public(public::refresh_get))
        // Protected
        .post("createBill", require_auth(protected::create_bill_post, false))
        .get("test", require_auth(protected::token_info_get, false))
        .get("getUserInfo", require_auth(protected::user_info_get, false))
        .get("bill/list", require_auth(protected::bill_list_get, true))
}
