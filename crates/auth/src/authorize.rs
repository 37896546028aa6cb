use serde::Serialize;

use crate::{PermissionId, PermissionRegistry, Principal, Role};

/// Decide whether `principal` may perform the operation gated by `required`.
///
/// - No IO
/// - No panics
/// - Absent principals are always denied
pub fn check_permission(
    principal: Option<&Principal>,
    registry: &PermissionRegistry,
    required: PermissionId,
) -> bool {
    match principal {
        Some(p) => p.holds(registry.code(required)),
        None => false,
    }
}

/// Same decision for a raw code; codes the registry does not know always deny.
pub fn check_code(principal: Option<&Principal>, registry: &PermissionRegistry, code: i32) -> bool {
    match registry.resolve(code) {
        Some(required) => check_permission(principal, registry, required),
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request was (or would be) allowed or denied.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: PermissionId,
    pub required_code: i32,
    pub granted: bool,
    pub reason: String,
    pub principal: Option<PrincipalState>,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub identifier: String,
    pub roles: Vec<String>,
    /// Effective permissions by name; codes the registry does not know are
    /// rendered as `#<code>`.
    pub effective_permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Anonymous,
    NoRoles,
    MissingPermission,
}

/// Explain the decision `check_permission` makes for `principal`, whose
/// permissions were resolved from `roles`.
pub fn explain_authorization(
    principal: Option<&Principal>,
    roles: &[Role],
    registry: &PermissionRegistry,
    required: PermissionId,
) -> AuthorizationExplanation {
    let required_code = registry.code(required);

    let Some(principal) = principal else {
        return AuthorizationExplanation {
            required_permission: required,
            required_code,
            granted: false,
            reason: "Request carries no authenticated principal".to_string(),
            principal: None,
            denial_reason: Some(DenialReason {
                kind: DenialKind::Anonymous,
                message: "Anonymous requests are never granted permissions".to_string(),
                suggestions: vec!["Log in and send the token as 'Authorization: Bearer <token>'".to_string()],
            }),
        };
    };

    let state = PrincipalState {
        identifier: principal.identifier.clone(),
        roles: roles.iter().map(|r| r.name.clone()).collect(),
        effective_permissions: principal
            .permissions
            .iter()
            .map(|code| match registry.resolve(*code) {
                Some(p) => p.name().to_string(),
                None => format!("#{code}"),
            })
            .collect(),
    };

    if check_permission(Some(principal), registry, required) {
        let granting: Vec<&str> = roles
            .iter()
            .filter(|r| r.grants(required_code))
            .map(|r| r.name.as_str())
            .collect();
        return AuthorizationExplanation {
            required_permission: required,
            required_code,
            granted: true,
            reason: format!("Permission '{}' is granted by role(s) {:?}", required, granting),
            principal: Some(state),
            denial_reason: None,
        };
    }

    let denial = if roles.is_empty() {
        DenialReason {
            kind: DenialKind::NoRoles,
            message: "The principal's user type has no roles".to_string(),
            suggestions: vec![format!("Attach a role that grants '{}' to the user type", required)],
        }
    } else {
        DenialReason {
            kind: DenialKind::MissingPermission,
            message: format!("Missing required permission: '{}'", required),
            suggestions: vec![
                format!("Add permission code {} to one of the roles {:?}", required_code, state.roles),
                format!("Attach a role that grants '{}' to the user type", required),
            ],
        }
    };

    AuthorizationExplanation {
        required_permission: required,
        required_code,
        granted: false,
        reason: format!(
            "Principal '{}' does not hold '{}'. Current permissions: {:?}",
            principal.identifier, required, state.effective_permissions
        ),
        principal: Some(state),
        denial_reason: Some(denial),
    }
}
