use serde::{Deserialize, Serialize};

use totes_core::{DomainResult, Entity, EntityId, UniqueKey, require_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStateType {
    #[serde(default)]
    pub id: EntityId,
    pub description: String,
}

impl OrderStateType {
    pub fn new(description: impl Into<String>) -> Self {
        Self { id: EntityId::UNSET, description: description.into() }
    }
}

impl Entity for OrderStateType {
    const KIND: &'static str = "order_state_type";

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
