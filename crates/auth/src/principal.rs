use std::collections::BTreeSet;

use serde::Serialize;

use crate::Role;
use crate::roles::effective_permissions;

/// The resolved actor of a request: identity plus effective permission codes.
///
/// Built per check from the user's type and roles; never cached or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub identifier: String,
    pub permissions: BTreeSet<i32>,
}

impl Principal {
    pub fn new(identifier: impl Into<String>, permissions: BTreeSet<i32>) -> Self {
        Self { identifier: identifier.into(), permissions }
    }

    /// Resolve a principal whose permissions are the union over `roles`.
    pub fn from_roles<'a, I>(identifier: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        Self::new(identifier, effective_permissions(roles))
    }

    pub fn holds(&self, code: i32) -> bool {
        self.permissions.contains(&code)
    }
}
