//! `totes-auth`: role-based authorization for the Totes backend.
//!
//! Pure policy: permission registry, RBAC reference records, the permission
//! check, token claims and password hashing. No storage, no HTTP.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthorizationExplanation, DenialKind, check_code, check_permission, explain_authorization};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{Permission, PermissionId, PermissionRegistry, RegistryError};
pub use principal::Principal;
pub use roles::{Role, UserType, effective_permissions};
pub use user::{ACTIVE_STATE, INACTIVE_STATE, User, UserStateType, normalize_email};
