pub mod bill;
pub mod session;
pub mod user;

pub use bill::{Bill, NewBill};
pub use session::{Session, SessionInfo};
pub use user::{NewUser, User};
