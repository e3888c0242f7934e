// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and the captcha flow.

pub mod auth;
pub mod captcha;

pub use auth::*;
pub use captcha::{captcha_get, check_captcha_post};
