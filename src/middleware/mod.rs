pub mod auth;
pub mod response;

pub use auth::{authenticate, require_auth, AuthContext};
pub use response::{Envelope, HandlerResult, Success};
