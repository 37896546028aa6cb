use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    response::Response,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use totes_auth::PermissionId;

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, PathParam, execute, json_body};
use crate::context::RequestContext;

use super::crud;
use super::resources::Items;

pub fn router() -> Router {
    crud::routes::<Items>()
        .route("/:id/state", patch(update_item_state))
        .route("/:id/stock", get(check_stock))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemStateRequest {
    pub item_state: bool,
}

pub async fn update_item_state(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("update state of item {raw}"), PermissionId::UpdateItemState);
    let bind = || -> Result<_, ApiError> { Ok((raw.id()?, json_body::<UpdateItemStateRequest>(&body)?)) };
    execute(app, &ctx, op, bind, |(id, req)| async move {
        let mut item = app.services.items.get(id).await.for_entity("item")?;
        item.item_state = req.item_state;
        app.services.items.update(id, item).await.for_entity("item")
    })
    .await
}

/// `{has_enough_stock}` for `?quantity=N`.
pub async fn check_stock(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("check stock of item {raw}"), PermissionId::CheckItemStock);
    let bind = || -> Result<_, ApiError> {
        let id = raw.id()?;
        let quantity: i64 = params
            .get("quantity")
            .and_then(|q| q.trim().parse().ok())
            .filter(|q| *q >= 0)
            .ok_or_else(|| ApiError::bad_request("quantity must be a non-negative integer"))?;
        Ok((id, quantity))
    };
    execute(app, &ctx, op, bind, |(id, quantity)| async move {
        let item = app.services.items.get(id).await.for_entity("item")?;
        Ok(json!({ "has_enough_stock": item.has_enough_stock(quantity)? }))
    })
    .await
}
