use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, UniqueKey, require_text};

/// Named bundle of permission codes.
///
/// The permission list is a set: it may be empty but never holds a code twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<i32>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>, permissions: Vec<i32>) -> DomainResult<Self> {
        let role = Self {
            id: EntityId::UNSET,
            name: name.into(),
            description: description.into(),
            permissions,
        };
        role.validate()?;
        Ok(role)
    }

    pub fn grants(&self, code: i32) -> bool {
        self.permissions.contains(&code)
    }
}

impl Entity for Role {
    const KIND: &'static str = "role";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", self.name.clone())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        let mut seen = HashSet::with_capacity(self.permissions.len());
        for code in &self.permissions {
            if !seen.insert(*code) {
                return Err(DomainError::validation(format!(
                    "role '{}' lists permission {code} more than once",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Named bundle of roles assigned to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roles: Vec<EntityId>,
}

impl UserType {
    pub fn new(name: impl Into<String>, description: impl Into<String>, roles: Vec<EntityId>) -> DomainResult<Self> {
        let user_type = Self {
            id: EntityId::UNSET,
            name: name.into(),
            description: description.into(),
            roles,
        };
        user_type.validate()?;
        Ok(user_type)
    }
}

impl Entity for UserType {
    const KIND: &'static str = "user_type";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", self.name.clone())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        let mut seen = HashSet::with_capacity(self.roles.len());
        for role in &self.roles {
            if !seen.insert(*role) {
                return Err(DomainError::validation(format!(
                    "user type '{}' lists role {role} more than once",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Union of the permission codes of every role.
pub fn effective_permissions<'a, I>(roles: I) -> BTreeSet<i32>
where
    I: IntoIterator<Item = &'a Role>,
{
    roles
        .into_iter()
        .flat_map(|r| r.permissions.iter().copied())
        .collect()
}
