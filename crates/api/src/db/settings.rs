//! Site settings stored as JSON values under string keys.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use super::RepositoryError;

/// Repository for the `setting` table.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a raw setting value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_raw(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        let value = sqlx::query_scalar("SELECT value FROM setting WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Get a typed setting, falling back to `T::default()` when the key is
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored value does not
    /// match `T`.
    pub async fn get_or_default<T>(&self, key: &str) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(key).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                warn!(key, error = %e, "Stored setting does not match its type");
                RepositoryError::DataCorruption(format!("setting {key}: {e}"))
            }),
            None => Ok(T::default()),
        }
    }

    /// Store a setting, replacing any previous value.
    ///
    /// Takes a connection so several keys can be written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set<T: Serialize>(
        conn: &mut PgConnection,
        key: &str,
        value: &T,
    ) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(value)
            .map_err(|e| RepositoryError::DataCorruption(format!("setting {key}: {e}")))?;
        sqlx::query(
            r"
            INSERT INTO setting (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(conn)
        .await?;
        Ok(())
    }
}
