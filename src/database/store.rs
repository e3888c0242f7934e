use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored record: a JSON object carrying a string `id`.
pub type Record = Map<String, Value>;

/// Predicate evaluated against every record of a collection.
pub type Matcher<'a> = &'a (dyn Fn(&Record) -> bool + Send + Sync);

/// Length of generated record ids
pub const ID_LENGTH: usize = 16;

/// Errors from any RecordStore backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record has no id")]
    MissingId,

    #[error("Could not allocate a unique id in '{0}'")]
    IdExhausted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Collection-keyed record storage.
///
/// Every call is atomic: callers never observe a partially applied write.
/// `find` returns matches in insertion order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of `collection` accepted by `matcher`, possibly empty.
    async fn find(&self, collection: &str, matcher: Matcher<'_>) -> Result<Vec<Record>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// Stores `data` under a freshly generated id, replacing any id it carried.
    async fn insert(&self, collection: &str, data: Record) -> Result<Record, StoreError>;

    /// Upsert by `data.id`; without an id this behaves like `insert`.
    async fn update(&self, collection: &str, data: Record) -> Result<Record, StoreError>;

    /// Deletes the record with `record.id`. Removing an absent record is a no-op.
    async fn remove(&self, collection: &str, record: &Record) -> Result<(), StoreError>;

    /// Inserts `data` only if no existing record matches, as one atomic step.
    /// Returns `None` when a match already existed.
    async fn insert_if_absent(
        &self,
        collection: &str,
        data: Record,
        matcher: Matcher<'_>,
    ) -> Result<Option<Record>, StoreError>;

    /// Deletes every matching record and returns how many were removed.
    async fn remove_where(&self, collection: &str, matcher: Matcher<'_>) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Serialize a value into a record. Anything that is not a JSON object is rejected.
pub fn to_record<T: Serialize + ?Sized>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

/// The record's id when it is a non-empty string.
pub fn record_id(record: &Record) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_record_rejects_non_objects() {
        assert!(matches!(to_record(&json!([1, 2])), Err(StoreError::NotAnObject)));
        assert!(to_record(&json!({ "a": 1 })).is_ok());
    }

    #[test]
    fn record_id_ignores_empty_and_non_string_ids() {
        let empty = to_record(&json!({ "id": "" })).unwrap();
        let numeric = to_record(&json!({ "id": 7 })).unwrap();
        let ok = to_record(&json!({ "id": "abc" })).unwrap();
        assert_eq!(record_id(&empty), None);
        assert_eq!(record_id(&numeric), None);
        assert_eq!(record_id(&ok), Some("abc"));
    }
}
