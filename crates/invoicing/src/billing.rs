//! Billing arithmetic.
//!
//! Discounts are computed on the subtotal and subtracted (never below zero);
//! taxes are computed on the discounted amount and added.

use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, EntityId};

use crate::Adjustment;

/// A requested quantity of an item. Wire shape is `{"id", "stock"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingItem {
    #[serde(rename = "id")]
    pub item_id: EntityId,
    #[serde(rename = "stock")]
    pub quantity: i64,
}

/// A billing item with its resolved unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingSummary {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
}

fn overflow() -> DomainError {
    DomainError::validation("amount overflow")
}

pub fn subtotal(lines: &[PricedLine]) -> DomainResult<i64> {
    lines.iter().try_fold(0i64, |acc, line| {
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive, got {}",
                line.quantity
            )));
        }
        line.unit_price
            .checked_mul(line.quantity)
            .and_then(|amount| acc.checked_add(amount))
            .ok_or_else(overflow)
    })
}

pub fn summarize(lines: &[PricedLine], discounts: &[Adjustment], taxes: &[Adjustment]) -> DomainResult<BillingSummary> {
    let subtotal = subtotal(lines)?;

    let mut discount = 0i64;
    for d in discounts {
        discount = discount.checked_add(d.amount_on(subtotal)?).ok_or_else(overflow)?;
    }
    let discounted = (subtotal - discount.min(subtotal)).max(0);

    let mut tax = 0i64;
    for t in taxes {
        tax = tax.checked_add(t.amount_on(discounted)?).ok_or_else(overflow)?;
    }
    let total = discounted.checked_add(tax).ok_or_else(overflow)?;

    Ok(BillingSummary {
        subtotal,
        discount: subtotal - discounted,
        tax,
        total,
    })
}
