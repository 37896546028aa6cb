//! Price calculation over stored items, discounts and taxes.

use axum::{
    body::Bytes,
    extract::Extension,
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use totes_auth::PermissionId;
use totes_core::EntityId;
use totes_inventory::Item;
use totes_invoicing::{Adjustment, BillingItem, BillingSummary, PricedLine, subtotal, summarize};

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, execute, json_body};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/subtotal", post(calculate_subtotal))
        .route("/total", post(calculate_total))
}

#[derive(Debug, Deserialize)]
pub struct CalculateTotalRequest {
    pub items: Vec<BillingItem>,
    #[serde(default)]
    pub discount_type_ids: Vec<EntityId>,
    #[serde(default)]
    pub tax_type_ids: Vec<EntityId>,
}

pub(crate) fn check_quantities(items: &[BillingItem]) -> Result<(), ApiError> {
    match items.iter().find(|i| i.quantity <= 0) {
        Some(bad) => Err(ApiError::bad_request(format!(
            "quantity for item {} must be positive",
            bad.item_id
        ))),
        None => Ok(()),
    }
}

/// Look up every billed item; an unknown id is a 404.
pub(crate) async fn price_lines(app: &AppState, items: &[BillingItem]) -> Result<Vec<(Item, PricedLine)>, ApiError> {
    let mut priced = Vec::with_capacity(items.len());
    for line in items {
        let item = app.services.items.get(line.item_id).await.for_entity("item")?;
        let priced_line = PricedLine { unit_price: item.selling_price, quantity: line.quantity };
        priced.push((item, priced_line));
    }
    Ok(priced)
}

pub(crate) async fn adjustments(
    app: &AppState,
    discount_ids: &[EntityId],
    tax_ids: &[EntityId],
) -> Result<(Vec<Adjustment>, Vec<Adjustment>), ApiError> {
    let mut discounts = Vec::with_capacity(discount_ids.len());
    for id in discount_ids {
        discounts.push(app.services.discount_types.get(*id).await.for_entity("discount type")?.adjustment);
    }
    let mut taxes = Vec::with_capacity(tax_ids.len());
    for id in tax_ids {
        taxes.push(app.services.tax_types.get(*id).await.for_entity("tax type")?.adjustment);
    }
    Ok((discounts, taxes))
}

pub(crate) async fn bill(
    app: &AppState,
    items: &[BillingItem],
    discount_ids: &[EntityId],
    tax_ids: &[EntityId],
) -> Result<(Vec<(Item, PricedLine)>, BillingSummary), ApiError> {
    let priced = price_lines(app, items).await?;
    let (discounts, taxes) = adjustments(app, discount_ids, tax_ids).await?;
    let lines: Vec<PricedLine> = priced.iter().map(|(_, line)| *line).collect();
    let summary = summarize(&lines, &discounts, &taxes)?;
    Ok((priced, summary))
}

pub async fn calculate_subtotal(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("calculate subtotal", PermissionId::CalculateSubtotal);
    let bind = || -> Result<Vec<BillingItem>, ApiError> {
        let items: Vec<BillingItem> = json_body(&body)?;
        check_quantities(&items)?;
        Ok(items)
    };
    execute(app, &ctx, op, bind, |items| async move {
        let priced = price_lines(&app, &items).await?;
        let lines: Vec<PricedLine> = priced.into_iter().map(|(_, line)| line).collect();
        Ok(json!({ "subtotal": subtotal(&lines)? }))
    })
    .await
}

/// Answers the full breakdown; `total` is the payable amount.
pub async fn calculate_total(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("calculate total", PermissionId::CalculateTotal);
    let bind = || -> Result<CalculateTotalRequest, ApiError> {
        let req: CalculateTotalRequest = json_body(&body)?;
        check_quantities(&req.items)?;
        Ok(req)
    };
    execute(app, &ctx, op, bind, |req| async move {
        let (_, summary) = bill(&app, &req.items, &req.discount_type_ids, &req.tax_type_ids).await?;
        Ok(summary)
    })
    .await
}
