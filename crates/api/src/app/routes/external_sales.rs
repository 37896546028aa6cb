use axum::{
    body::Bytes,
    extract::Extension,
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;

use totes_auth::PermissionId;
use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};
use totes_infra::ServiceError;
use totes_invoicing::ExternalSale;
use totes_parties::Customer;

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, execute, json_body};
use crate::context::RequestContext;

use super::crud;
use super::resources::ExternalSales;

pub fn router() -> Router {
    crud::routes::<ExternalSales>().collection(post(report_external_sale)).build()
}

/// A partner's sale report. The buyer is given in full so an unknown
/// customer can be registered on the spot.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalSaleReport {
    pub reporter_name: String,
    pub reporter_id: String,
    pub item_id: EntityId,
    pub stock: i64,
    #[serde(flatten)]
    pub customer: Customer,
}

impl ExternalSaleReport {
    fn validate(&self) -> DomainResult<()> {
        require_text("reporter_name", &self.reporter_name)?;
        require_text("reporter_id", &self.reporter_id)?;
        if !self.item_id.is_set() {
            return Err(DomainError::MissingField("item_id"));
        }
        if self.stock <= 0 {
            return Err(DomainError::validation("stock must be positive"));
        }
        self.customer.validate()
    }
}

/// The stored customer with the report's personal identifier, registering
/// the reported one when none exists yet.
async fn resolve_customer(app: &AppState, reported: Customer) -> Result<Customer, ApiError> {
    let key = reported.customer_id.trim().to_string();
    let customers = &app.services.customers;
    match customers.find_by_key("customer_id", &key).await {
        Ok(existing) => Ok(existing),
        Err(ServiceError::NotFound) => match customers.create(reported).await {
            Ok(created) => Ok(created),
            // Registered concurrently by another report.
            Err(ServiceError::Conflict(_)) => customers.find_by_key("customer_id", &key).await.for_entity("customer"),
            Err(e) => Err(e).for_entity("customer"),
        },
        Err(e) => Err(e).for_entity("customer"),
    }
}

/// Record a sale made outside the shop. Stock is not decremented.
pub async fn report_external_sale(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("create external sale", PermissionId::CreateExternalSale).created();
    let bind = || -> Result<ExternalSaleReport, ApiError> {
        let report: ExternalSaleReport = json_body(&body)?;
        report.validate()?;
        Ok(report)
    };
    execute(app, &ctx, op, bind, |report| async move {
        let item = app.services.items.get(report.item_id).await.for_entity("item")?;
        let customer = resolve_customer(app, report.customer).await?;

        let sale = ExternalSale {
            id: EntityId::UNSET,
            reporter_name: report.reporter_name,
            reporter_id: report.reporter_id,
            item_id: item.id,
            item_name: item.name,
            customer_id: customer.id,
            customer_email: customer.email,
            stock: report.stock,
        };
        app.services.external_sales.create(sale).await.for_entity("external sale")
    })
    .await
}
