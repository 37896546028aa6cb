use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};

use crate::{BillingItem, BillingSummary};

/// What a client submits to create an invoice; totals are always computed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceDraft {
    pub enterprise_data: String,
    pub customer_id: EntityId,
    pub items: Vec<BillingItem>,
    #[serde(default)]
    pub discount_type_ids: Vec<EntityId>,
    #[serde(default)]
    pub tax_type_ids: Vec<EntityId>,
}

impl InvoiceDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("enterprise_data", &self.enterprise_data)?;
        if !self.customer_id.is_set() {
            return Err(DomainError::MissingField("customer_id"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("an invoice needs at least one item"));
        }
        if let Some(bad) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(DomainError::validation(format!(
                "quantity for item {} must be positive",
                bad.item_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub id: EntityId,
    pub enterprise_data: String,
    pub date_time: DateTime<Utc>,
    pub customer_id: EntityId,
    /// Customer's personal/tax identifier, copied at issue time.
    pub customer_personal_id: String,
    pub subtotal: i64,
    pub total: i64,
    pub items: Vec<BillingItem>,
    #[serde(default)]
    pub discount_type_ids: Vec<EntityId>,
    #[serde(default)]
    pub tax_type_ids: Vec<EntityId>,
}

impl Invoice {
    pub fn issue(
        draft: InvoiceDraft,
        customer_personal_id: impl Into<String>,
        summary: BillingSummary,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        let invoice = Self {
            id: EntityId::UNSET,
            enterprise_data: draft.enterprise_data,
            date_time: now,
            customer_id: draft.customer_id,
            customer_personal_id: customer_personal_id.into(),
            subtotal: summary.subtotal,
            total: summary.total,
            items: draft.items,
            discount_type_ids: draft.discount_type_ids,
            tax_type_ids: draft.tax_type_ids,
        };
        invoice.validate()?;
        Ok(invoice)
    }
}

impl Entity for Invoice {
    const KIND: &'static str = "invoice";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "customer_personal_id"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("customer_personal_id", &self.customer_personal_id)?;
        if self.subtotal < 0 || self.total < 0 {
            return Err(DomainError::invariant("invoice amounts must not be negative"));
        }
        Ok(())
    }
}
