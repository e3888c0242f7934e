use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row, Transaction};
use tracing::info;

use super::store::{record_id, Matcher, Record, RecordStore, StoreError, ID_LENGTH};
use crate::utils::random_string;

const MAX_ID_ATTEMPTS: usize = 8;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS mock_records (
        seq BIGSERIAL,
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
"#;

/// RecordStore backed by a single PostgreSQL table of JSONB documents.
///
/// Predicates are Rust closures, so `find` loads the collection and filters
/// in-process. `seq` preserves insertion order across upserts.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the backing table exists
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        info!("Connected record store to PostgreSQL");
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

fn decode(value: Value) -> Result<Record, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

async fn load_collection(
    tx: &mut Transaction<'_, Postgres>,
    collection: &str,
) -> Result<Vec<Record>, StoreError> {
    let rows = sqlx::query("SELECT data FROM mock_records WHERE collection = $1 ORDER BY seq")
        .bind(collection)
        .fetch_all(&mut **tx)
        .await?;
    rows.into_iter()
        .map(|row| decode(row.try_get::<Value, _>("data")?))
        .collect()
}

/// Serialize writers of one collection for the rest of the transaction
async fn lock_collection(tx: &mut Transaction<'_, Postgres>, collection: &str) -> Result<(), StoreError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(collection)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_fresh(
    tx: &mut Transaction<'_, Postgres>,
    collection: &str,
    mut data: Record,
) -> Result<Record, StoreError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = random_string(ID_LENGTH);
        data.insert("id".to_string(), Value::String(id.clone()));
        let inserted = sqlx::query(
            "INSERT INTO mock_records (collection, id, data) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(data.clone()))
        .execute(&mut **tx)
        .await?;
        if inserted.rows_affected() == 1 {
            return Ok(data);
        }
    }
    Err(StoreError::IdExhausted(collection.to_string()))
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find(&self, collection: &str, matcher: Matcher<'_>) -> Result<Vec<Record>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let records = load_collection(&mut tx, collection).await?;
        tx.commit().await?;
        Ok(records.into_iter().filter(|r| matcher(r)).collect())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query("SELECT data FROM mock_records WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| decode(row.try_get::<Value, _>("data")?)).transpose()
    }

    async fn insert(&self, collection: &str, data: Record) -> Result<Record, StoreError> {
        let mut tx = self.pool.begin().await?;
        let stored = insert_fresh(&mut tx, collection, data).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn update(&self, collection: &str, data: Record) -> Result<Record, StoreError> {
        let Some(id) = record_id(&data).map(str::to_string) else {
            return self.insert(collection, data).await;
        };

        sqlx::query(
            r#"
            INSERT INTO mock_records (collection, id, data) VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(data.clone()))
        .execute(&self.pool)
        .await?;
        Ok(data)
    }

    async fn remove(&self, collection: &str, record: &Record) -> Result<(), StoreError> {
        let id = record_id(record).ok_or(StoreError::MissingId)?;
        sqlx::query("DELETE FROM mock_records WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        data: Record,
        matcher: Matcher<'_>,
    ) -> Result<Option<Record>, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_collection(&mut tx, collection).await?;

        let existing = load_collection(&mut tx, collection).await?;
        if existing.iter().any(|r| matcher(r)) {
            tx.rollback().await?;
            return Ok(None);
        }

        let stored = insert_fresh(&mut tx, collection, data).await?;
        tx.commit().await?;
        Ok(Some(stored))
    }

    async fn remove_where(&self, collection: &str, matcher: Matcher<'_>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_collection(&mut tx, collection).await?;

        let ids: Vec<String> = load_collection(&mut tx, collection)
            .await?
            .iter()
            .filter(|r| matcher(r))
            .filter_map(|r| record_id(r).map(str::to_string))
            .collect();

        let removed = if ids.is_empty() {
            0
        } else {
            sqlx::query("DELETE FROM mock_records WHERE collection = $1 AND id = ANY($2)")
                .bind(collection)
                .bind(&ids)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };
        tx.commit().await?;
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
