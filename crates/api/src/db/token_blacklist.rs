//! Revoked JWT ids.
//!
//! A token is revoked while a row for its `jti` exists with `expires_at` in
//! the future. Rows past their expiry are dead weight (the token would be
//! rejected as expired anyway) and are removed by [`purge_expired`].
//!
//! [`purge_expired`]: TokenBlacklistRepository::purge_expired

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use bazaar_core::UserId;

use super::RepositoryError;

/// Repository for the token blacklist.
pub struct TokenBlacklistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenBlacklistRepository<'a> {
    /// Create a new blacklist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revoke a token. Revoking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self))]
    pub async fn revoke(
        &self,
        jti: Uuid,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO token_blacklist (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            ",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Whether `jti` is currently revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, RepositoryError> {
        let revoked = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW())",
        )
        .bind(jti)
        .fetch_one(self.pool)
        .await?;
        Ok(revoked)
    }

    /// Delete entries whose token has expired.
    ///
    /// # Returns
    ///
    /// Returns the number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;
        let purged = result.rows_affected();
        debug!(purged, "Purged expired blacklist entries");
        Ok(purged)
    }
}
