//! Entity persistence.
//!
//! A repository stores one entity kind. Writes are atomic per call and natural
//! keys (`Entity::unique_keys`) are enforced by the backend itself, so two
//! concurrent inserts of the same key cannot both succeed.

mod in_memory;
mod postgres;

use std::sync::Arc;

use thiserror::Error;

use totes_core::{Entity, EntityId};

pub use in_memory::InMemoryRepository;
pub use postgres::{PostgresRepository, apply_schema};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique key '{key}' already exists")]
    UniqueViolation { key: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored record could not be (de)serialized: {0}")]
    Serialization(String),
}

#[async_trait::async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get(&self, id: EntityId) -> Result<Option<E>, StoreError>;

    /// All records, ascending by id.
    async fn list(&self) -> Result<Vec<E>, StoreError>;

    /// Partial, case-insensitive match on a serialized field.
    async fn search(&self, field: &str, needle: &str) -> Result<Vec<E>, StoreError>;

    /// Exact match on a serialized field.
    async fn filter_eq(&self, field: &str, value: &str) -> Result<Vec<E>, StoreError>;

    /// Lookup through a declared unique key.
    async fn find_by_key(&self, key: &str, value: &str) -> Result<Option<E>, StoreError>;

    /// Store a new record, assigning its id.
    async fn insert(&self, entity: E) -> Result<E, StoreError>;

    /// Replace the record with `entity.id()`; `None` when it does not exist.
    async fn update(&self, entity: E) -> Result<Option<E>, StoreError>;

    /// `false` when nothing was deleted.
    async fn delete(&self, id: EntityId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<E, R> Repository<E> for Arc<R>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    async fn get(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<E>, StoreError> {
        (**self).list().await
    }

    async fn search(&self, field: &str, needle: &str) -> Result<Vec<E>, StoreError> {
        (**self).search(field, needle).await
    }

    async fn filter_eq(&self, field: &str, value: &str) -> Result<Vec<E>, StoreError> {
        (**self).filter_eq(field, value).await
    }

    async fn find_by_key(&self, key: &str, value: &str) -> Result<Option<E>, StoreError> {
        (**self).find_by_key(key, value).await
    }

    async fn insert(&self, entity: E) -> Result<E, StoreError> {
        (**self).insert(entity).await
    }

    async fn update(&self, entity: E) -> Result<Option<E>, StoreError> {
        (**self).update(entity).await
    }

    async fn delete(&self, id: EntityId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}
