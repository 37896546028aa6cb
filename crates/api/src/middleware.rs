use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use totes_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::RequestContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Attach a [`RequestContext`] to every request.
///
/// No `Authorization` header yields an anonymous context. A header that is
/// present but unusable, or a token that fails validation, is rejected with
/// 401 before any handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let ctx = match extract_bearer(req.headers())? {
        None => RequestContext::anonymous(),
        Some(token) => {
            let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                json_error(StatusCode::UNAUTHORIZED, "invalid or expired token")
            })?;
            RequestContext::authenticated(claims.sub)
        }
    };

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        principal = %ctx.principal_label(),
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).instrument(span).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, Response> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let unauthorized = || json_error(StatusCode::UNAUTHORIZED, "malformed Authorization header");

    let header = header.to_str().map_err(|_| unauthorized())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(unauthorized)?.trim();
    if token.is_empty() {
        return Err(unauthorized());
    }
    Ok(Some(token))
}
