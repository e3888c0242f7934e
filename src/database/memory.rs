use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::store::{record_id, Matcher, Record, RecordStore, StoreError, ID_LENGTH};
use crate::utils::random_string;

const MAX_ID_ATTEMPTS: usize = 8;

/// In-process RecordStore. Each collection is a Vec kept in insertion order;
/// every operation holds the lock for its whole duration.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(records: &[Record], id: &str) -> Option<usize> {
    records.iter().position(|r| record_id(r) == Some(id))
}

fn fresh_id(collection: &str, records: &[Record]) -> Result<String, StoreError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = random_string(ID_LENGTH);
        if position(records, &id).is_none() {
            return Ok(id);
        }
    }
    Err(StoreError::IdExhausted(collection.to_string()))
}

fn push_new(collection: &str, records: &mut Vec<Record>, mut data: Record) -> Result<Record, StoreError> {
    let id = fresh_id(collection, records)?;
    data.insert("id".to_string(), Value::String(id));
    records.push(data.clone());
    Ok(data)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, collection: &str, matcher: Matcher<'_>) -> Result<Vec<Record>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| records.iter().filter(|r| matcher(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| position(records, id).map(|i| records[i].clone())))
    }

    async fn insert(&self, collection: &str, data: Record) -> Result<Record, StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        push_new(collection, records, data)
    }

    async fn update(&self, collection: &str, data: Record) -> Result<Record, StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();

        let Some(id) = record_id(&data).map(str::to_string) else {
            return push_new(collection, records, data);
        };

        match position(records, &id) {
            Some(i) => records[i] = data.clone(),
            None => records.push(data.clone()),
        }
        Ok(data)
    }

    async fn remove(&self, collection: &str, record: &Record) -> Result<(), StoreError> {
        let id = record_id(record).ok_or(StoreError::MissingId)?;
        let mut collections = self.collections.write().await;
        if let Some(records) = collections.get_mut(collection) {
            records.retain(|r| record_id(r) != Some(id));
        }
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        data: Record,
        matcher: Matcher<'_>,
    ) -> Result<Option<Record>, StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.iter().any(|r| matcher(r)) {
            return Ok(None);
        }
        push_new(collection, records, data).map(Some)
    }

    async fn remove_where(&self, collection: &str, matcher: Matcher<'_>) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|r| !matcher(r));
        Ok((before - records.len()) as u64)
    }
}
