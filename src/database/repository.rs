use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::store::{to_record, Record, RecordStore, StoreError};

/// Implemented by every stored model so records can be addressed by id
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the model lives in
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Typed view over one collection of a RecordStore
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

fn decode<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Serialize `data` and make sure it reads back as `T` before anything is
/// written. Catches values serde turns into `null`, such as a NaN float.
fn checked_record<T, N>(data: &N) -> Result<Record, StoreError>
where
    T: DeserializeOwned,
    N: Serialize + ?Sized,
{
    let record = to_record(data)?;
    let mut candidate = record.clone();
    candidate
        .entry("id")
        .or_insert_with(|| Value::String(String::new()));
    decode::<T>(candidate)?;
    Ok(record)
}

/// Evaluate a typed predicate against a raw record inside an atomic store
/// call. Records that do not decode as `T` never match.
fn typed_match<T, P>(record: &Record, predicate: &P) -> bool
where
    T: DeserializeOwned,
    P: Fn(&T) -> bool,
{
    match serde_json::from_value::<T>(Value::Object(record.clone())) {
        Ok(item) => predicate(&item),
        Err(e) => {
            tracing::warn!("Skipping undecodable record {:?}: {}", record.get("id"), e);
            false
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Every record accepted by `predicate`, in insertion order
    pub async fn select_any<P>(&self, predicate: P) -> Result<Vec<T>, StoreError>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        let mut matched = Vec::new();
        for record in self.store.find(T::COLLECTION, &|_: &Record| true).await? {
            let item: T = decode(record)?;
            if predicate(&item) {
                matched.push(item);
            }
        }
        Ok(matched)
    }

    /// First record accepted by `predicate`
    pub async fn select_one<P>(&self, predicate: P) -> Result<Option<T>, StoreError>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        Ok(self.select_any(predicate).await?.into_iter().next())
    }

    pub async fn select_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Insert any serializable payload; the store assigns the id
    pub async fn insert<N>(&self, data: &N) -> Result<T, StoreError>
    where
        N: Serialize + Sync,
    {
        let record = checked_record::<T, N>(data)?;
        decode(self.store.insert(T::COLLECTION, record).await?)
    }

    /// Insert unless a record accepted by `predicate` already exists
    pub async fn insert_unless<N, P>(&self, data: &N, predicate: P) -> Result<Option<T>, StoreError>
    where
        N: Serialize + Sync,
        P: Fn(&T) -> bool + Send + Sync,
    {
        let record = checked_record::<T, N>(data)?;
        let matcher = |record: &Record| typed_match::<T, P>(record, &predicate);
        self.store
            .insert_if_absent(T::COLLECTION, record, &matcher)
            .await?
            .map(decode)
            .transpose()
    }

    /// Upsert by the entity's id
    pub async fn update(&self, entity: &T) -> Result<T, StoreError> {
        let record = checked_record::<T, T>(entity)?;
        decode(self.store.update(T::COLLECTION, record).await?)
    }

    pub async fn remove(&self, entity: &T) -> Result<(), StoreError> {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::String(entity.id().to_string()));
        self.store.remove(T::COLLECTION, &record).await
    }

    pub async fn delete_any<P>(&self, predicate: P) -> Result<u64, StoreError>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        let matcher = |record: &Record| typed_match::<T, P>(record, &predicate);
        self.store.remove_where(T::COLLECTION, &matcher).await
    }
}
