pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Entity, Repository};
pub use store::{Matcher, Record, RecordStore, StoreError};
