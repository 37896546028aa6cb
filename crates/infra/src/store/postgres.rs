//! Postgres-backed repository.
//!
//! ## Layout
//!
//! | table | role |
//! |-------|------|
//! | `entity_sequences` | per-kind id allocation |
//! | `entities` | one JSONB body per `(kind, id)` |
//! | `entity_keys` | natural keys; its primary key rejects duplicates |
//!
//! Every write runs in its own transaction. A dropped transaction rolls back.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (other) | Any other | `Backend` |
//! | Other | N/A | `Backend` |

use std::marker::PhantomData;

use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use totes_core::{Entity, EntityId};

use super::{Repository, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_schema.sql");

/// Create the storage tables if they do not exist.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

#[derive(Debug)]
pub struct PostgresRepository<E> {
    pool: PgPool,
    _kind: PhantomData<fn() -> E>,
}

impl<E> Clone for PostgresRepository<E> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), _kind: PhantomData }
    }
}

impl<E: Entity> PostgresRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _kind: PhantomData }
    }

    async fn fetch_bodies(&self, operation: &str, query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>) -> Result<Vec<E>, StoreError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.into_iter()
            .map(|row| decode::<E>(row.try_get("body").map_err(|e| map_sqlx_error(operation, e))?))
            .collect()
    }
}

fn decode<E: Entity>(body: Value) -> Result<E, StoreError> {
    serde_json::from_value(body).map_err(|e| StoreError::Serialization(format!("{} row: {e}", E::KIND)))
}

fn encode<E: Entity>(entity: &E) -> Result<Value, StoreError> {
    serde_json::to_value(entity).map_err(|e| StoreError::Serialization(format!("{} row: {e}", E::KIND)))
}

/// Escape LIKE wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

async fn claim_keys<E: Entity>(tx: &mut Transaction<'_, Postgres>, entity: &E, id: i64) -> Result<(), StoreError> {
    for key in entity.unique_keys() {
        sqlx::query("INSERT INTO entity_keys (kind, key_name, key_value, entity_id) VALUES ($1, $2, $3, $4)")
            .bind(E::KIND)
            .bind(key.name)
            .bind(&key.value)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| match map_sqlx_error("claim_key", e) {
                StoreError::UniqueViolation { .. } => StoreError::UniqueViolation { key: key.name.to_string() },
                other => other,
            })?;
    }
    Ok(())
}

async fn release_keys(tx: &mut Transaction<'_, Postgres>, kind: &str, id: i64) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM entity_keys WHERE kind = $1 AND entity_id = $2")
        .bind(kind)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("release_keys", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl<E: Entity> Repository<E> for PostgresRepository<E> {
    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn get(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        let row = sqlx::query("SELECT body FROM entities WHERE kind = $1 AND id = $2")
            .bind(E::KIND)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        match row {
            Some(row) => Ok(Some(decode(row.try_get("body").map_err(|e| map_sqlx_error("get", e))?)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn list(&self) -> Result<Vec<E>, StoreError> {
        self.fetch_bodies(
            "list",
            sqlx::query("SELECT body FROM entities WHERE kind = $1 ORDER BY id").bind(E::KIND),
        )
        .await
    }

    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn search(&self, field: &str, needle: &str) -> Result<Vec<E>, StoreError> {
        self.fetch_bodies(
            "search",
            sqlx::query(
                r#"
                SELECT body FROM entities
                WHERE kind = $1 AND body->>$2 ILIKE $3 ESCAPE '\'
                ORDER BY id
                "#,
            )
            .bind(E::KIND)
            .bind(field.to_string())
            .bind(like_pattern(needle)),
        )
        .await
    }

    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn filter_eq(&self, field: &str, value: &str) -> Result<Vec<E>, StoreError> {
        self.fetch_bodies(
            "filter_eq",
            sqlx::query("SELECT body FROM entities WHERE kind = $1 AND body->>$2 = $3 ORDER BY id")
                .bind(E::KIND)
                .bind(field.to_string())
                .bind(value.to_string()),
        )
        .await
    }

    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn find_by_key(&self, key: &str, value: &str) -> Result<Option<E>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT e.body FROM entity_keys k
            JOIN entities e ON e.kind = k.kind AND e.id = k.entity_id
            WHERE k.kind = $1 AND k.key_name = $2 AND k.key_value = $3
            "#,
        )
        .bind(E::KIND)
        .bind(key)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_key", e))?;
        match row {
            Some(row) => Ok(Some(decode(row.try_get("body").map_err(|e| map_sqlx_error("find_by_key", e))?)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, entity), fields(entity = E::KIND), err)]
    async fn insert(&self, mut entity: E) -> Result<E, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO entity_sequences (kind, last_id) VALUES ($1, 1)
            ON CONFLICT (kind) DO UPDATE SET last_id = entity_sequences.last_id + 1
            RETURNING last_id
            "#,
        )
        .bind(E::KIND)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("allocate_id", e))?;
        entity.set_id(EntityId::new(id).map_err(|e| StoreError::Backend(e.to_string()))?);

        claim_keys(&mut tx, &entity, id).await?;

        sqlx::query("INSERT INTO entities (kind, id, body) VALUES ($1, $2, $3)")
            .bind(E::KIND)
            .bind(id)
            .bind(encode(&entity)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_entity", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(entity)
    }

    #[instrument(skip(self, entity), fields(entity = E::KIND, id = %entity.id()), err)]
    async fn update(&self, entity: E) -> Result<Option<E>, StoreError> {
        let id = entity.id().get();
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query("UPDATE entities SET body = $3 WHERE kind = $1 AND id = $2")
            .bind(E::KIND)
            .bind(id)
            .bind(encode(&entity)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_entity", e))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        release_keys(&mut tx, E::KIND, id).await?;
        claim_keys(&mut tx, &entity, id).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(Some(entity))
    }

    #[instrument(skip(self), fields(entity = E::KIND), err)]
    async fn delete(&self, id: EntityId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let deleted = sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
            .bind(E::KIND)
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_entity", e))?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }
        release_keys(&mut tx, E::KIND, id.get()).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation {
                    key: db_err.constraint().unwrap_or("unknown").to_string(),
                },
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
