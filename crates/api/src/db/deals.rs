//! Daily deal repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bazaar_core::{DealId, ProductId, UserId};

use super::RepositoryError;
use crate::models::deal::{Deal, DealProduct, ValidDeal};

const DEAL_COLUMNS: &str =
    "id, product_id, discount_percent, ends_at, is_active, created_by, created_at, updated_at";

const ONE_ACTIVE_MESSAGE: &str = "Product already has an active deal";

#[derive(sqlx::FromRow)]
struct LiveDealRow {
    #[sqlx(flatten)]
    deal: Deal,
    #[sqlx(flatten)]
    product: DealProduct,
}

/// Repository for deal database operations.
pub struct DealRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DealRepository<'a> {
    /// Create a new deal repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every deal, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Deal>, RepositoryError> {
        let deals = sqlx::query_as::<_, Deal>(&format!(
            "SELECT {DEAL_COLUMNS} FROM deal ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(deals)
    }

    /// Deals live at `now`, soonest ending first, with their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn live_with_products(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Deal, DealProduct)>, RepositoryError> {
        let rows = sqlx::query_as::<_, LiveDealRow>(
            r"
            SELECT d.id, d.product_id, d.discount_percent, d.ends_at, d.is_active,
                   d.created_by, d.created_at, d.updated_at,
                   p.name, p.image, p.price, p.rating, p.num_reviews, p.count_in_stock
            FROM deal d
            JOIN product p ON p.id = d.product_id
            WHERE d.is_active AND d.ends_at > $1
            ORDER BY d.ends_at, d.id
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.deal, r.product)).collect())
    }

    /// The active deal for a product, if any (it may have ended).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Deal>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let deals = Self::active_for_products(&mut *conn, &[product_id]).await?;
        Ok(deals.into_iter().next())
    }

    /// Active deals for the given products, using an existing connection or
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_for_products(
        conn: &mut PgConnection,
        product_ids: &[ProductId],
    ) -> Result<Vec<Deal>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let deals = sqlx::query_as::<_, Deal>(&format!(
            "SELECT {DEAL_COLUMNS} FROM deal WHERE is_active AND product_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(conn)
        .await?;
        Ok(deals)
    }

    /// Get a deal by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        let deal = sqlx::query_as::<_, Deal>(&format!(
            "SELECT {DEAL_COLUMNS} FROM deal WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(deal)
    }

    /// Switch off active deals whose window has closed.
    ///
    /// An expired deal still holds its product's one-active slot until this
    /// runs, so writes call it first and the housekeeping task calls it
    /// hourly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn retire_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE deal SET is_active = FALSE, updated_at = NOW() WHERE is_active AND ends_at <= NOW()",
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Create a deal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if it would be a second active
    /// deal for the product.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        deal: &ValidDeal,
        created_by: UserId,
    ) -> Result<Deal, RepositoryError> {
        self.retire_expired().await?;
        sqlx::query_as::<_, Deal>(&format!(
            r"
            INSERT INTO deal (product_id, discount_percent, ends_at, is_active, created_by)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM product WHERE id = $1)
            RETURNING {DEAL_COLUMNS}
            "
        ))
        .bind(deal.product_id)
        .bind(deal.discount)
        .bind(deal.ends_at)
        .bind(deal.is_active)
        .bind(created_by)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, ONE_ACTIVE_MESSAGE))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace a deal's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the deal doesn't exist.
    /// Returns `RepositoryError::Conflict` if it would be a second active
    /// deal for the product.
    #[instrument(skip(self))]
    pub async fn update(&self, id: DealId, deal: &ValidDeal) -> Result<Deal, RepositoryError> {
        self.retire_expired().await?;
        sqlx::query_as::<_, Deal>(&format!(
            r"
            UPDATE deal SET
                product_id = $2, discount_percent = $3, ends_at = $4, is_active = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DEAL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(deal.product_id)
        .bind(deal.discount)
        .bind(deal.ends_at)
        .bind(deal.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(map_deal_write_error)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Switch a deal on or off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the deal doesn't exist.
    /// Returns `RepositoryError::Conflict` if another deal for the product
    /// is already active.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: DealId, is_active: bool) -> Result<Deal, RepositoryError> {
        if is_active {
            self.retire_expired().await?;
        }
        sqlx::query_as::<_, Deal>(&format!(
            "UPDATE deal SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {DEAL_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, ONE_ACTIVE_MESSAGE))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a deal.
    ///
    /// # Returns
    ///
    /// Returns `true` if the deal was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: DealId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM deal WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Unique violation means a second active deal; a foreign-key violation
/// means the target product does not exist.
fn map_deal_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::unique_violation(e, ONE_ACTIVE_MESSAGE)
}
