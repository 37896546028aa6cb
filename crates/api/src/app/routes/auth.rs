//! Login and permission introspection.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use totes_auth::{PermissionId, check_code, explain_authorization, normalize_email, verify_password};
use totes_infra::ServiceError;

use crate::app::AppState;
use crate::app::errors::{ApiError, ServiceResultExt};
use crate::app::pipeline::{Gate, Operation, execute, json_body};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/auth/check-permission", get(check_permission))
        .route("/auth/explain", get(explain))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid email or password".to_string())
}

pub async fn login(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let app = &app;
    let op = Operation::new("log in", Gate::Public);
    execute(app, &ctx, op, || json_body::<LoginRequest>(&body), |req| async move {
        let user = match app.services.users.find_by_key("email", &normalize_email(&req.email)).await {
            Ok(user) => user,
            Err(ServiceError::NotFound) => return Err(invalid_credentials()),
            Err(e) => return Err(ApiError::from_service(e, "user")),
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&req.password, &hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "password verification task failed");
                ApiError::Internal
            })?
            .unwrap_or_else(|e| {
                tracing::warn!(user = %user.email, error = %e, "stored password hash is unreadable");
                false
            });
        if !matches {
            return Err(invalid_credentials());
        }
        if !user.is_active() {
            return Err(ApiError::Forbidden("user is inactive".to_string()));
        }

        let token = app.jwt.issue(&user.email, Utc::now(), app.token_ttl).map_err(|e| {
            tracing::error!(error = %e, "token could not be issued");
            ApiError::Internal
        })?;
        Ok(json!({ "message": "login successful", "token": token }))
    })
    .await
}

/// Whether the user behind `email` holds the permission with code
/// `permission_id`. Unknown users and unknown codes answer false.
pub async fn check_permission(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let app = &app;
    let op = Operation::new("check a user's permission", Gate::Authenticated);
    let bind = || -> Result<(String, i32), ApiError> {
        let email = params
            .get("email")
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ApiError::bad_request("query parameter 'email' is required"))?;
        let code = params
            .get("permission_id")
            .ok_or_else(|| ApiError::bad_request("query parameter 'permission_id' is required"))?;
        let code = code
            .trim()
            .parse::<i32>()
            .map_err(|_| ApiError::bad_request(format!("permission_id '{code}' is not a number")))?;
        Ok((email.to_string(), code))
    };
    execute(app, &ctx, op, bind, |(email, code)| async move {
        let resolved = app.policy.resolve(&email).await.for_entity("user")?;
        let granted = check_code(resolved.as_ref().map(|r| &r.principal), &app.registry, code);
        Ok(json!({ "has_permission": granted }))
    })
    .await
}

/// Explain the caller's own decision for `?permission=NAME`.
pub async fn explain(
    Extension(app): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let app = &app;
    let op = Operation::new("explain a permission decision", Gate::Authenticated);
    let bind = || -> Result<PermissionId, ApiError> {
        let name = params
            .get("permission")
            .ok_or_else(|| ApiError::bad_request("query parameter 'permission' is required"))?;
        PermissionId::from_name(name.trim())
            .ok_or_else(|| ApiError::bad_request(format!("unknown permission '{name}'")))
    };
    let caller = &ctx;
    execute(app, &ctx, op, bind, |required| async move {
        let resolved = authz::resolve_caller(app, caller).await;
        let (principal, roles) = match &resolved {
            Some(r) => (Some(&r.principal), r.roles.as_slice()),
            None => (None, &[][..]),
        };
        Ok(explain_authorization(principal, roles, &app.registry, required))
    })
    .await
}
