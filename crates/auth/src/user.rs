//! User accounts and their lifecycle states.

use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, UniqueKey, require_text};

/// Seeded state type id for active accounts.
pub const ACTIVE_STATE: i64 = 1;
/// Seeded state type id for inactive accounts.
pub const INACTIVE_STATE: i64 = 2;

/// A login account. `email` is the principal identifier and is stored
/// trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: EntityId,
    pub email: String,
    pub password_hash: String,
    pub user_type_id: EntityId,
    pub user_state_type_id: EntityId,
}

impl User {
    pub fn new(
        email: &str,
        password_hash: String,
        user_type_id: EntityId,
        user_state_type_id: EntityId,
    ) -> DomainResult<Self> {
        let user = Self {
            id: EntityId::UNSET,
            email: normalize_email(email),
            password_hash,
            user_type_id,
            user_state_type_id,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn is_active(&self) -> bool {
        self.user_state_type_id.get() == ACTIVE_STATE
    }
}

impl Entity for User {
    const KIND: &'static str = "user";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "email"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("email", self.email.clone())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("email", &self.email)?;
        if !looks_like_email(&self.email) {
            return Err(DomainError::validation(format!("'{}' is not a valid email", self.email)));
        }
        require_text("password", &self.password_hash)?;
        if !self.user_type_id.is_set() {
            return Err(DomainError::MissingField("user_type_id"));
        }
        if !self.user_state_type_id.is_set() {
            return Err(DomainError::MissingField("user_state_type_id"));
        }
        Ok(())
    }
}

/// Account lifecycle state reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStateType {
    #[serde(default)]
    pub id: EntityId,
    pub description: String,
}

impl UserStateType {
    pub fn new(description: impl Into<String>) -> Self {
        Self { id: EntityId::UNSET, description: description.into() }
    }
}

impl Entity for UserStateType {
    const KIND: &'static str = "user_state_type";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("description", self.description.clone())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("description", &self.description)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
