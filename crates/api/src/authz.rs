//! Authorization guard for the request pipeline.
//!
//! The principal is resolved from storage on every check. A resolution
//! failure denies the request and is logged; it never surfaces as an error.

use tracing::warn;

use totes_auth::{PermissionId, check_permission};
use totes_infra::ResolvedPrincipal;

use crate::app::AppState;
use crate::context::RequestContext;

/// Resolve the caller, or `None` when anonymous, unknown, or unresolvable.
pub async fn resolve_caller(app: &AppState, ctx: &RequestContext) -> Option<ResolvedPrincipal> {
    let subject = ctx.subject()?;
    match app.policy.resolve(subject).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(principal = subject, error = %e, "principal resolution failed; denying");
            None
        }
    }
}

/// Whether the caller holds `permission`.
pub async fn check(app: &AppState, ctx: &RequestContext, permission: PermissionId) -> bool {
    let resolved = resolve_caller(app, ctx).await;
    check_permission(resolved.as_ref().map(|r| &r.principal), &app.registry, permission)
}
