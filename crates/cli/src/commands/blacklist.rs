//! Token blacklist maintenance.
//!
//! The API purges on a timer; this is for one-off cleanup or cron.

use bazaar_api::db::{RepositoryError, TokenBlacklistRepository};

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum BlacklistError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Delete blacklist entries whose tokens have expired.
pub async fn purge() -> Result<(), BlacklistError> {
    let pool = connect().await?;
    let purged = TokenBlacklistRepository::new(&pool).purge_expired().await?;
    tracing::info!(purged, "Purged expired blacklist entries");
    Ok(())
}
