use sqlx::PgPool;
use tracing::instrument;

use super::{AuditEntry, AuditError, AuditLog};

/// Appends to the `audit_log` table.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditLog for PostgresAuditLog {
    #[instrument(skip(self, entry), err)]
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        sqlx::query("INSERT INTO audit_log (occurred_at, principal, message) VALUES ($1, $2, $3)")
            .bind(entry.occurred_at)
            .bind(&entry.principal)
            .bind(&entry.message)
            .execute(&self.pool)
            .await
            .map_err(|e| AuditError(e.to_string()))?;
        Ok(())
    }
}
