//! The generic entity service: one instance per entity kind.
//!
//! Each call performs exactly one logical persistence operation. Permission
//! checks and audit writes belong to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use totes_core::{DomainError, Entity, EntityId};

use crate::store::{Repository, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { key } => ServiceError::Conflict(format!("{key} already exists")),
            other => ServiceError::Persistence(other.to_string()),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct CrudService<E: Entity> {
    repo: Arc<dyn Repository<E>>,
}

impl<E: Entity> Clone for CrudService<E> {
    fn clone(&self) -> Self {
        Self { repo: Arc::clone(&self.repo) }
    }
}

impl<E: Entity> CrudService<E> {
    pub fn new(repo: Arc<dyn Repository<E>>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: EntityId) -> ServiceResult<E> {
        self.repo.get(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn list(&self) -> ServiceResult<Vec<E>> {
        Ok(self.repo.list().await?)
    }

    /// Partial, case-insensitive search on one of `E::SEARCH_FIELDS`.
    /// No match is an empty list, not an error.
    pub async fn search(&self, field: &str, needle: &str) -> ServiceResult<Vec<E>> {
        if !E::SEARCH_FIELDS.contains(&field) {
            return Err(ServiceError::Validation(format!("{} cannot be searched by '{field}'", E::KIND)));
        }
        Ok(self.repo.search(field, needle).await?)
    }

    /// Records whose `field` equals `value` exactly.
    pub async fn find_where(&self, field: &str, value: &str) -> ServiceResult<Vec<E>> {
        Ok(self.repo.filter_eq(field, value).await?)
    }

    pub async fn find_by_key(&self, key: &str, value: &str) -> ServiceResult<E> {
        self.repo.find_by_key(key, value).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn exists(&self, id: EntityId) -> ServiceResult<bool> {
        Ok(self.repo.get(id).await?.is_some())
    }

    /// Validate, pre-check natural keys, then insert.
    ///
    /// The pre-check gives a readable conflict in the common case; the store
    /// still rejects a duplicate that races past it.
    pub async fn create(&self, mut entity: E) -> ServiceResult<E> {
        entity.set_id(EntityId::UNSET);
        entity.validate()?;
        for key in entity.unique_keys() {
            if self.repo.find_by_key(key.name, &key.value).await?.is_some() {
                return Err(ServiceError::Conflict(format!("{} '{}' already exists", key.name, key.value)));
            }
        }
        let created = self.repo.insert(entity).await?;
        debug!(entity = E::KIND, id = %created.id(), "created");
        Ok(created)
    }

    pub async fn update(&self, id: EntityId, mut entity: E) -> ServiceResult<E> {
        entity.set_id(id);
        entity.validate()?;
        if self.repo.get(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }
        for key in entity.unique_keys() {
            if let Some(holder) = self.repo.find_by_key(key.name, &key.value).await? {
                if holder.id() != id {
                    return Err(ServiceError::Conflict(format!("{} '{}' already exists", key.name, key.value)));
                }
            }
        }
        self.repo.update(entity).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn delete(&self, id: EntityId) -> ServiceResult<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }
}
