// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require authentication.

pub mod login; // POST /login - check credentials, issue tokens
pub mod refresh; // GET /refresh - trade a refresh token for a new pair
pub mod register; // POST /register - create account, issue tokens

pub use login::login_post;
pub use refresh::refresh_get;
pub use register::register_post;
