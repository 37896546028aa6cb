use serde::{Deserialize, Serialize};

use totes_core::{DomainResult, Entity, EntityId, UniqueKey, require_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
}

impl ItemType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: EntityId::UNSET, name: name.into() }
    }
}

impl Entity for ItemType {
    const KIND: &'static str = "item_type";

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
