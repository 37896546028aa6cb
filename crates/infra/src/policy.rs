//! Resolves the principal behind an authenticated identifier.
//!
//! Resolution reads the store on every call: email → user → user type → roles.

use totes_auth::{Principal, Role, User, normalize_email};
use tracing::warn;

use crate::service::{ServiceError, ServiceResult};
use crate::services::Services;

#[derive(Debug, Clone)]
pub struct ResolvedPrincipal {
    pub principal: Principal,
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Clone)]
pub struct PolicyResolver {
    services: Services,
}

impl PolicyResolver {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// `None` when no user has this email.
    ///
    /// Inactive users and users whose type is missing resolve with no roles,
    /// so every check denies them. Role ids that no longer exist are skipped.
    pub async fn resolve(&self, email: &str) -> ServiceResult<Option<ResolvedPrincipal>> {
        let user = match self.services.users.find_by_key("email", &normalize_email(email)).await {
            Ok(user) => user,
            Err(ServiceError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        let roles = if user.is_active() { self.roles_of(&user).await? } else { Vec::new() };
        Ok(Some(ResolvedPrincipal {
            principal: Principal::from_roles(user.email.clone(), &roles),
            user,
            roles,
        }))
    }

    async fn roles_of(&self, user: &User) -> ServiceResult<Vec<Role>> {
        let user_type = match self.services.user_types.get(user.user_type_id).await {
            Ok(t) => t,
            Err(ServiceError::NotFound) => {
                warn!(user = %user.email, user_type_id = %user.user_type_id, "user type missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut roles = Vec::with_capacity(user_type.roles.len());
        for role_id in &user_type.roles {
            match self.services.roles.get(*role_id).await {
                Ok(role) => roles.push(role),
                Err(ServiceError::NotFound) => {
                    warn!(user_type = %user_type.name, role_id = %role_id, "role missing")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(roles)
    }
}
