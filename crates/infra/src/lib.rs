//! Infrastructure layer: storage backends, the generic entity service, the
//! audit log, configuration and startup seeding.

pub mod audit;
pub mod config;
pub mod policy;
pub mod seed;
pub mod service;
pub mod services;
pub mod store;

mod integration_tests;

pub use audit::{AuditEntry, AuditError, AuditLog, AuditLogWriter, InMemoryAuditLog, PostgresAuditLog};
pub use config::{AppConfig, StorageBackend};
pub use policy::{PolicyResolver, ResolvedPrincipal};
pub use service::{CrudService, ServiceError, ServiceResult};
pub use services::Services;
pub use store::{InMemoryRepository, PostgresRepository, Repository, StoreError};
