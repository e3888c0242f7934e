// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Every handler here takes an `AuthContext` and is registered through
// `require_auth`, which verifies the bearer token before the call.

pub mod bill; // Expense records of the caller
pub mod user; // Caller profile and token echo

pub use bill::{bill_list_get, create_bill_post};
pub use user::{token_info_get, user_info_get};
