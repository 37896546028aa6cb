//! `totes-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the persisted entity contract, domain errors.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, UniqueKey, require_text};
pub use error::{DomainError, DomainResult};
pub use id::EntityId;
