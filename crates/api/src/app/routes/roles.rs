//! Extra read routes on roles and user types.

use axum::{
    extract::Extension,
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

use totes_auth::{Permission, PermissionId};

use crate::app::AppState;
use crate::app::errors::ServiceResultExt;
use crate::app::pipeline::{Operation, PathParam, execute};
use crate::context::RequestContext;

use super::crud;
use super::resources::{Roles, UserTypes};

pub fn roles_router() -> Router {
    crud::routes::<Roles>()
        .route("/:id/permissions", get(role_permissions))
        .route("/:id/exists", get(role_exists))
        .build()
}

pub fn user_types_router() -> Router {
    crud::routes::<UserTypes>()
        .route("/:id/exists", get(user_type_exists))
        .build()
}

/// Permission records granted by a role, in code order.
pub async fn role_permissions(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("list permissions of role {raw}"), PermissionId::GetAllPermissionsOfRole);
    execute(app, &ctx, op, || raw.id(), |id| async move {
        let role = app.services.roles.get(id).await.for_entity("role")?;
        let mut granted: Vec<Permission> = app
            .services
            .permissions
            .list()
            .await
            .for_entity("permission")?
            .into_iter()
            .filter(|p| role.grants(p.code))
            .collect();
        granted.sort_by_key(|p| p.code);
        Ok(granted)
    })
    .await
}

pub async fn role_exists(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("check role {raw} exists"), PermissionId::ExistRole);
    execute(app, &ctx, op, || raw.id(), |id| async move {
        let exists = app.services.roles.exists(id).await.for_entity("role")?;
        Ok(json!({ "exists": exists }))
    })
    .await
}

pub async fn user_type_exists(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("check user type {raw} exists"), PermissionId::ExistUserType);
    execute(app, &ctx, op, || raw.id(), |id| async move {
        let exists = app.services.user_types.exists(id).await.for_entity("user type")?;
        Ok(json!({ "exists": exists }))
    })
    .await
}
