use axum::{
    extract::Extension,
    response::Response,
    routing::get,
    Router,
};

use totes_auth::PermissionId;

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, PathParam, execute};
use crate::context::RequestContext;

use super::crud;
use super::resources::Customers;

pub fn router() -> Router {
    crud::routes::<Customers>()
        .route("/customer-id/:customer_id", get(get_by_customer_id))
        .route("/email/:email", get(get_by_email))
        .build()
}

fn required(raw: &str, what: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{what} is required")));
    }
    Ok(value.to_string())
}

/// Lookup by personal/tax identifier (the natural key).
pub async fn get_by_customer_id(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("get customer by customer id {raw}"), PermissionId::GetCustomerByCustomerId);
    execute(app, &ctx, op, || raw.value().and_then(|v| required(v, "customer id")), |customer_id| async move {
        app.services.customers.find_by_key("customer_id", &customer_id).await.for_entity("customer")
    })
    .await
}

pub async fn get_by_email(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("get customer by email {raw}"), PermissionId::GetCustomerByEmail);
    execute(app, &ctx, op, || raw.value().and_then(|v| required(v, "email")), |email| async move {
        app.services
            .customers
            .find_where("email", &email)
            .await
            .for_entity("customer")?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("customer"))
    })
    .await
}
