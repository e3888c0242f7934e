pub mod format;
pub mod params;

pub use format::{format_dto, format_entity, DtoKind};
