//! The request pipeline every audited operation runs through.
//!
//! Stages, strictly in order:
//!
//! 1. **log attempt**: a failed audit write aborts with 500; nothing else runs
//! 2. **authorize**: denial is audited and answered with 403
//! 3. **bind**: invalid input is audited and answered with 400
//! 4. **invoke**: the operation itself
//! 5. **map**: outcome is audited, errors map through [`ApiError`]
//!
//! Audit writes after the attempt are best-effort: the outcome is already
//! decided, so a failure there is logged and the response stands.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;

use axum::extract::{FromRequestParts, Path};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};

use totes_auth::PermissionId;

use crate::app::AppState;
use crate::app::errors::{ApiError, json_error};
use crate::authz;
use crate::context::RequestContext;

/// Who may run an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Anyone, including anonymous callers (login).
    Public,
    /// Any authenticated caller.
    Authenticated,
    Permission(PermissionId),
}

#[derive(Debug, Clone)]
pub struct Operation {
    action: String,
    gate: Gate,
    success: StatusCode,
}

impl Operation {
    /// `action` reads as a verb phrase, e.g. "create customer".
    pub fn new(action: impl Into<String>, gate: Gate) -> Self {
        Self { action: action.into(), gate, success: StatusCode::OK }
    }

    pub fn guarded(action: impl Into<String>, permission: PermissionId) -> Self {
        Self::new(action, Gate::Permission(permission))
    }

    pub fn created(mut self) -> Self {
        self.success = StatusCode::CREATED;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

pub async fn execute<I, T, B, F, Fut>(app: &AppState, ctx: &RequestContext, op: Operation, bind: B, invoke: F) -> Response
where
    B: FnOnce() -> Result<I, ApiError>,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    T: Serialize,
{
    let principal = ctx.subject();

    if let Err(e) = app.audit.register(principal, format!("Attempting to {}", op.action)).await {
        error!(action = %op.action, error = %e, "attempt could not be audited; aborting");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "request could not be audited");
    }

    if !authorized(app, ctx, op.gate).await {
        record(app, ctx, format!("Access denied for {}", op.action)).await;
        let message = match op.gate {
            Gate::Permission(p) => format!("permission denied: {}", p.name()),
            _ => "authentication required".to_string(),
        };
        info!(action = %op.action, status = 403, "denied");
        return ApiError::Forbidden(message).into_response();
    }

    let input = match bind() {
        Ok(input) => input,
        Err(e) => {
            record(app, ctx, format!("Invalid request for {}: {e}", op.action)).await;
            info!(action = %op.action, status = e.status().as_u16(), "rejected input");
            return e.into_response();
        }
    };

    match invoke(input).await {
        Ok(body) => {
            record(app, ctx, format!("Completed {}", op.action)).await;
            info!(action = %op.action, status = op.success.as_u16(), "completed");
            (op.success, Json(body)).into_response()
        }
        Err(e) => {
            record(app, ctx, format!("Failed to {}: {e}", op.action)).await;
            info!(action = %op.action, status = e.status().as_u16(), "failed");
            e.into_response()
        }
    }
}

async fn authorized(app: &AppState, ctx: &RequestContext, gate: Gate) -> bool {
    match gate {
        Gate::Public => true,
        Gate::Authenticated => ctx.subject().is_some(),
        Gate::Permission(p) => authz::check(app, ctx, p).await,
    }
}

async fn record(app: &AppState, ctx: &RequestContext, message: String) {
    if let Err(e) = app.audit.register(ctx.subject(), message).await {
        warn!(principal = %ctx.principal_label(), error = %e, "audit write failed after outcome");
    }
}

/// Parse a JSON body, mapping any failure to 400.
pub fn json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))
}

/// Parse a path id, mapping any failure to 400.
pub fn path_id(raw: &str) -> Result<totes_core::EntityId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(format!("invalid id '{raw}'")))
}

/// A single path segment whose decoding is judged at the bind stage.
///
/// Extraction never rejects, so an undecodable segment still reaches the
/// attempt and authorization stages before it is answered with 400.
#[derive(Debug, Clone)]
pub struct PathParam(Result<String, ApiError>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PathParam {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = Path::<String>::from_request_parts(parts, state)
            .await
            .map(|Path(raw)| raw)
            .map_err(|e| ApiError::bad_request(format!("invalid path parameter: {}", e.body_text())));
        Ok(Self(raw))
    }
}

impl PathParam {
    pub fn value(&self) -> Result<&str, ApiError> {
        self.0.as_deref().map_err(Clone::clone)
    }

    pub fn id(&self) -> Result<totes_core::EntityId, ApiError> {
        path_id(self.value()?)
    }
}

impl fmt::Display for PathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Ok(raw) => f.write_str(raw),
            Err(_) => f.write_str("<undecodable>"),
        }
    }
}
