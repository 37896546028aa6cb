use serde::{Deserialize, Serialize};

use totes_core::{DomainResult, Entity, EntityId, UniqueKey, require_text};

/// Kind of personal identifier (citizenship card, tax id, passport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierType {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
}

impl IdentifierType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: EntityId::UNSET, name: name.into() }
    }
}

impl Entity for IdentifierType {
    const KIND: &'static str = "identifier_type";

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
        require_text("name", &self.name)
    }
}
