use axum::{
    body::Bytes,
    extract::Extension,
    response::Response,
    routing::post,
    Router,
};
use chrono::Utc;

use totes_auth::PermissionId;
use totes_invoicing::{Invoice, InvoiceDraft};

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, execute, json_body};
use crate::context::RequestContext;

use super::billing;
use super::crud;
use super::resources::Invoices;

pub fn router() -> Router {
    crud::routes::<Invoices>().collection(post(create_invoice)).build()
}

/// Issue an invoice: totals and date are computed here, never taken from
/// the client. Stock is checked but not decremented.
pub async fn create_invoice(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("create invoice", PermissionId::CreateInvoice).created();
    let bind = || -> Result<InvoiceDraft, ApiError> {
        let draft: InvoiceDraft = json_body(&body)?;
        draft.validate()?;
        Ok(draft)
    };
    execute(app, &ctx, op, bind, |draft| async move {
        let customer = app.services.customers.get(draft.customer_id).await.for_entity("customer")?;

        let (priced, summary) =
            billing::bill(&app, &draft.items, &draft.discount_type_ids, &draft.tax_type_ids).await?;
        for (item, line) in &priced {
            if !item.has_enough_stock(line.quantity)? {
                return Err(ApiError::bad_request(format!(
                    "insufficient stock for item {}: requested {}, available {}",
                    item.id, line.quantity, item.stock
                )));
            }
        }

        let invoice = Invoice::issue(draft, customer.customer_id, summary, Utc::now())?;
        app.services.invoices.create(invoice).await.for_entity("invoice")
    })
    .await
}
