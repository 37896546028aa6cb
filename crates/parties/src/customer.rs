use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, UniqueKey, require_text};

/// A customer, either a person or a business.
///
/// `customer_id` is the customer's personal or tax identifier (unique), not
/// the store-assigned `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: EntityId,
    pub customer_name: String,
    #[serde(default)]
    pub last_name: String,
    pub customer_id: String,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_numbers: String,
    #[serde(default = "active")]
    pub customer_state: bool,
    pub email: String,
    pub identifier_type_id: EntityId,
}

fn active() -> bool {
    true
}

impl Entity for Customer {
    const KIND: &'static str = "customer";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "customer_name", "last_name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("customer_id", self.customer_id.trim())]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("customer_name", &self.customer_name)?;
        require_text("customer_id", &self.customer_id)?;
        require_text("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(DomainError::validation(format!("'{}' is not a valid email", self.email)));
        }
        if !self.identifier_type_id.is_set() {
            return Err(DomainError::MissingField("identifier_type_id"));
        }
        Ok(())
    }
}
