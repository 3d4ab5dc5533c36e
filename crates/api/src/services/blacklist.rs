//! Token revocation with a positive in-memory cache.
//!
//! Revoked `jti`s are remembered in a `moka` cache so repeated requests with
//! a logged-out token skip the database. Only positive answers are cached:
//! a token that is not revoked yet may be revoked at any moment.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use bazaar_core::UserId;

use crate::db::{DealRepository, RepositoryError, TokenBlacklistRepository};

/// How often expired rows are purged and lapsed deals switched off.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Revoked-token lookup shared by all requests.
#[derive(Clone)]
pub struct TokenBlacklist {
    revoked: Cache<Uuid, ()>,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    #[must_use]
    pub fn new() -> Self {
        let revoked = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(60 * 60))
            .build();
        Self { revoked }
    }

    /// Revoke `jti` until `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn revoke(
        &self,
        pool: &PgPool,
        jti: Uuid,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        TokenBlacklistRepository::new(pool)
            .revoke(jti, user_id, expires_at)
            .await?;
        self.revoked.insert(jti, ()).await;
        Ok(())
    }

    /// Whether `jti` has been revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss whose lookup fails.
    pub async fn is_revoked(&self, pool: &PgPool, jti: Uuid) -> Result<bool, RepositoryError> {
        if self.revoked.contains_key(&jti) {
            return Ok(true);
        }
        let revoked = TokenBlacklistRepository::new(pool).is_revoked(jti).await?;
        if revoked {
            self.revoked.insert(jti, ()).await;
        }
        Ok(revoked)
    }

    /// Purge expired rows and retire lapsed deals every `interval` until the
    /// process exits.
    pub fn spawn_purge_task(pool: PgPool, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match TokenBlacklistRepository::new(&pool).purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "Purged expired blacklist entries"),
                    Err(e) => warn!(error = %e, "Blacklist purge failed"),
                }
                match DealRepository::new(&pool).retire_expired().await {
                    Ok(0) => {}
                    Ok(retired) => info!(retired, "Retired expired deals"),
                    Err(e) => warn!(error = %e, "Deal expiry sweep failed"),
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    #[tokio::test]
    async fn test_cached_revocation_skips_database() {
        // The lazy pool never connects; a cache hit must not touch it.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap();
        let blacklist = TokenBlacklist::new();
        let jti = Uuid::new_v4();
        blacklist.revoked.insert(jti, ()).await;

        assert!(blacklist.is_revoked(&pool, jti).await.unwrap());
    }
}
