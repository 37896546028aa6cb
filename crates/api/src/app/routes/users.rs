//! User writes: passwords are hashed here, never stored as received.

use axum::{
    body::Bytes,
    extract::Extension,
    response::Response,
    routing::{patch, post, put},
    Router,
};
use serde::Deserialize;

use totes_auth::{ACTIVE_STATE, PermissionId, User, hash_password, password::validate_password};
use totes_core::EntityId;

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Operation, PathParam, execute, json_body};
use crate::context::RequestContext;

use super::crud;
use super::resources::{UserView, Users};

pub fn router() -> Router {
    crud::routes::<Users>()
        .collection(post(create_user))
        .member(put(update_user))
        .route("/:id/state", patch(update_user_state))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub user_type_id: EntityId,
    #[serde(default)]
    pub user_state_type_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    /// Keeps the current password when absent.
    #[serde(default)]
    pub password: Option<String>,
    pub user_type_id: EntityId,
    pub user_state_type_id: EntityId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStateRequest {
    pub user_state_type_id: EntityId,
}

async fn hash(app: &AppState, password: String) -> Result<String, ApiError> {
    let cost = app.bcrypt_cost;
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ApiError::Internal
        })?
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Reject references to user types or state types that do not exist.
async fn check_references(app: &AppState, user_type_id: EntityId, state_id: EntityId) -> Result<(), ApiError> {
    if !app.services.user_types.exists(user_type_id).await.for_entity("user type")? {
        return Err(ApiError::bad_request(format!("user type {user_type_id} does not exist")));
    }
    if !app.services.user_state_types.exists(state_id).await.for_entity("user state type")? {
        return Err(ApiError::bad_request(format!("user state type {state_id} does not exist")));
    }
    Ok(())
}

pub async fn create_user(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded("create user", PermissionId::CreateUser).created();
    let bind = || -> Result<CreateUserRequest, ApiError> {
        let req: CreateUserRequest = json_body(&body)?;
        validate_password(&req.password).map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(req)
    };
    execute(app, &ctx, op, bind, |req| async move {
        let state_id = match req.user_state_type_id {
            Some(id) => id,
            None => EntityId::new(ACTIVE_STATE)?,
        };
        check_references(&app, req.user_type_id, state_id).await?;

        let password_hash = hash(&app, req.password).await?;
        let user = User::new(&req.email, password_hash, req.user_type_id, state_id)?;
        let created = app.services.users.create(user).await.for_entity("user")?;
        Ok(UserView::from(created))
    })
    .await
}

pub async fn update_user(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("update user {raw}"), PermissionId::UpdateUser);
    let bind = || -> Result<_, ApiError> {
        let req: UpdateUserRequest = json_body(&body)?;
        if let Some(password) = &req.password {
            validate_password(password).map_err(|e| ApiError::bad_request(e.to_string()))?;
        }
        Ok((raw.id()?, req))
    };
    execute(app, &ctx, op, bind, |(id, req)| async move {
        let current = app.services.users.get(id).await.for_entity("user")?;
        check_references(&app, req.user_type_id, req.user_state_type_id).await?;

        let password_hash = match req.password {
            Some(password) => hash(&app, password).await?,
            None => current.password_hash,
        };
        let user = User::new(&req.email, password_hash, req.user_type_id, req.user_state_type_id)?;
        let updated = app.services.users.update(id, user).await.for_entity("user")?;
        Ok(UserView::from(updated))
    })
    .await
}

pub async fn update_user_state(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    raw: PathParam,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::guarded(format!("update state of user {raw}"), PermissionId::UpdateUserState);
    let bind = || -> Result<_, ApiError> { Ok((raw.id()?, json_body::<UpdateUserStateRequest>(&body)?)) };
    execute(app, &ctx, op, bind, |(id, req)| async move {
        let mut user = app.services.users.get(id).await.for_entity("user")?;
        if !app.services.user_state_types.exists(req.user_state_type_id).await.for_entity("user state type")? {
            return Err(ApiError::bad_request(format!(
                "user state type {} does not exist",
                req.user_state_type_id
            )));
        }
        user.user_state_type_id = req.user_state_type_id;
        let updated = app.services.users.update(id, user).await.for_entity("user")?;
        Ok(UserView::from(updated))
    })
    .await
}
