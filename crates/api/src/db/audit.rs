//! Audit log repository.

use sqlx::PgPool;

use bazaar_core::AuditEntryId;

use super::RepositoryError;
use crate::models::audit::{AuditEntry, NewAuditEntry};

/// Repository for the `audit_log` table.
pub struct AuditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, entry: &NewAuditEntry) -> Result<AuditEntryId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO audit_log (actor_id, action, entity_type, entity_id, details, request_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id.as_deref())
        .bind(&entry.details)
        .bind(entry.request_id.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// One page of entries, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<AuditEntry>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(self.pool)
            .await?;

        let entries = sqlx::query_as::<_, AuditEntry>(
            r"
            SELECT a.id, a.actor_id, u.name AS actor_name, a.action, a.entity_type,
                   a.entity_id, a.details, a.request_id, a.created_at
            FROM audit_log a
            LEFT JOIN shop_user u ON u.id = a.actor_id
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page_size)
        .bind((page - 1).saturating_mul(page_size))
        .fetch_all(self.pool)
        .await?;

        Ok((entries, total))
    }
}
