use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, UniqueKey, require_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: EntityId,
    pub names: String,
    pub last_names: String,
    pub personal_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_numbers: String,
    /// Login account of the employee.
    pub user_id: EntityId,
    pub identifier_type_id: EntityId,
}

impl Entity for Employee {
    const KIND: &'static str = "employee";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "names"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("personal_id", self.personal_id.trim())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("names", &self.names)?;
        require_text("last_names", &self.last_names)?;
        require_text("personal_id", &self.personal_id)?;
        if !self.user_id.is_set() {
            return Err(DomainError::MissingField("user_id"));
        }
        if !self.identifier_type_id.is_set() {
            return Err(DomainError::MissingField("identifier_type_id"));
        }
        Ok(())
    }
}
