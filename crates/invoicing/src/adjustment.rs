//! Discounts and taxes share one shape: a percentage or a fixed amount.

use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, UniqueKey, require_text};

/// 100% expressed in basis points.
pub const FULL_BASIS_POINTS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// Share of the base in basis points (1250 = 12.5%).
    Percentage { basis_points: i64 },
    /// Flat amount in cents.
    Fixed { cents: i64 },
}

impl Adjustment {
    /// Amount this adjustment represents on `base`, rounding half up.
    pub fn amount_on(&self, base: i64) -> DomainResult<i64> {
        match *self {
            Adjustment::Percentage { basis_points } => {
                let scaled = base
                    .checked_mul(basis_points)
                    .and_then(|v| v.checked_add(FULL_BASIS_POINTS / 2))
                    .ok_or_else(|| DomainError::validation("amount overflow"))?;
                Ok(scaled / FULL_BASIS_POINTS)
            }
            Adjustment::Fixed { cents } => Ok(cents),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        match *self {
            Adjustment::Percentage { basis_points } if basis_points < 0 => {
                Err(DomainError::validation("percentage must not be negative"))
            }
            Adjustment::Fixed { cents } if cents < 0 => {
                Err(DomainError::validation("fixed amount must not be negative"))
            }
            _ => Ok(()),
        }
    }
}

macro_rules! adjustment_entity {
    ($t:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $t {
            #[serde(default)]
            pub id: EntityId,
            pub name: String,
            pub adjustment: Adjustment,
        }

        impl Entity for $t {
            const KIND: &'static str = $kind;

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
                self.adjustment.validate()
            }
        }
    };
}

adjustment_entity!(DiscountType, "discount_type");
adjustment_entity!(TaxType, "tax_type");
