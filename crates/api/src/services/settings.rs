//! Cached public settings.
//!
//! Every cart quote and checkout needs the pricing policy, so the settings
//! are held in memory and reloaded only after an admin write or when the
//! cache entry expires.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::settings::{PRICING_KEY, STORE_KEY, SettingsUpdate};
use crate::models::PublicSettings;

const CACHE_KEY: &str = "public";
const CACHE_TTL: Duration = Duration::from_secs(300);

/// In-memory view of the `setting` table.
#[derive(Clone)]
pub struct SiteSettings {
    cache: Cache<&'static str, PublicSettings>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteSettings {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Current settings, loading them if the cache is cold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings cannot be read.
    pub async fn get(&self, pool: &PgPool) -> Result<PublicSettings, RepositoryError> {
        if let Some(settings) = self.cache.get(CACHE_KEY).await {
            return Ok(settings);
        }

        let repo = SettingsRepository::new(pool);
        let settings = PublicSettings {
            store: repo.get_or_default(STORE_KEY).await?,
            pricing: repo.get_or_default(PRICING_KEY).await?,
        };
        debug!("Loaded settings");
        self.cache.insert(CACHE_KEY, settings.clone()).await;
        Ok(settings)
    }

    /// Validate and store `update` in one transaction, then return the new
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an invalid section, or a database
    /// error if the write fails.
    #[instrument(skip(self, pool, update))]
    pub async fn update(
        &self,
        pool: &PgPool,
        update: &SettingsUpdate,
    ) -> crate::error::Result<PublicSettings> {
        let update = update.validated()?;
        let mut tx = pool.begin().await.map_err(RepositoryError::from)?;
        if let Some(store) = &update.store {
            SettingsRepository::set(&mut *tx, STORE_KEY, store).await?;
        }
        if let Some(pricing) = &update.pricing {
            SettingsRepository::set(&mut *tx, PRICING_KEY, pricing).await?;
        }
        tx.commit().await.map_err(RepositoryError::from)?;
        self.cache.invalidate(CACHE_KEY).await;
        Ok(self.get(pool).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    #[tokio::test]
    async fn test_cached_settings_skip_database() {
        // The lazy pool never connects; a cache hit must not touch it.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bazaar_unreachable")
            .unwrap();
        let settings = SiteSettings::new();
        settings
            .cache
            .insert(CACHE_KEY, PublicSettings::default())
            .await;

        let loaded = settings.get(&pool).await.unwrap();
        assert_eq!(loaded, PublicSettings::default());
    }
}
