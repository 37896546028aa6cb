//! The append-only audit log.
//!
//! Distinct from operational tracing: entries are persisted and attributable.
//! Each entry is also mirrored on the `audit` tracing target at debug level.

mod postgres;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use postgres::PostgresAuditLog;

/// Principal label recorded for unauthenticated requests.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub occurred_at: DateTime<Utc>,
    pub principal: String,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

/// Port for persisting audit entries.
#[async_trait::async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuditError("in-memory audit log lock poisoned".to_string()))?;
        entries.push(entry);
        Ok(())
    }
}

/// Stamps and writes audit entries. Cheap to clone.
#[derive(Clone)]
pub struct AuditLogWriter {
    log: Arc<dyn AuditLog>,
}

impl AuditLogWriter {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// Append `(now, principal, message)`; `None` records [`ANONYMOUS`].
    pub async fn register(&self, principal: Option<&str>, message: impl Into<String>) -> Result<(), AuditError> {
        let entry = AuditEntry {
            occurred_at: Utc::now(),
            principal: principal.unwrap_or(ANONYMOUS).to_string(),
            message: message.into(),
        };
        tracing::debug!(target: "audit", principal = %entry.principal, message = %entry.message);
        self.log.append(entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenLog;

    #[async_trait::async_trait]
    impl AuditLog for BrokenLog {
        async fn append(&self, _entry: AuditEntry) -> Result<(), AuditError> {
            Err(AuditError("disk full".into()))
        }
    }

    #[tokio::test]
    async fn entries_are_stamped_and_attributed() {
        let log = Arc::new(InMemoryAuditLog::new());
        let writer = AuditLogWriter::new(log.clone());

        writer.register(Some("ana@totes.test"), "Attempting to list customers").await.unwrap();
        writer.register(None, "Access denied for list customers").await.unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].principal, "ana@totes.test");
        assert_eq!(entries[1].principal, ANONYMOUS);
        assert!(entries[0].occurred_at <= entries[1].occurred_at);
    }

    #[tokio::test]
    async fn backend_failures_surface() {
        let writer = AuditLogWriter::new(Arc::new(BrokenLog));
        assert!(writer.register(None, "x").await.is_err());
    }
}
