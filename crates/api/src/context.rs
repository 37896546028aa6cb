use uuid::Uuid;

use totes_infra::audit::ANONYMOUS;

/// Per-request identity, inserted by the auth middleware.
///
/// A request without an `Authorization` header is anonymous: it still runs
/// through the pipeline and is audited, but every permission check denies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
    subject: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { request_id: Uuid::now_v7(), subject: None }
    }

    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self { request_id: Uuid::now_v7(), subject: Some(subject.into()) }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The token subject (normalized email), if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Identifier recorded in the audit log.
    pub fn principal_label(&self) -> &str {
        self.subject().unwrap_or(ANONYMOUS)
    }
}
