//! Product and review repository.

use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use bazaar_core::{ProductId, Rating, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::product::{Product, ProductInput, ProductQuery, Review};

const PRODUCT_COLUMNS: &str = "id, user_id, name, image, brand, category, description, price, \
     count_in_stock, rating, num_reviews, created_at, updated_at";

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search the catalog.
    ///
    /// Returns one page of products (newest first) and the total number of
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &ProductQuery,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let keyword = query.keyword().map(like_pattern);
        let category = query.category();

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM product
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
            ",
        )
        .bind(keyword.as_deref())
        .bind(category)
        .fetch_one(self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM product
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(keyword.as_deref())
        .bind(category)
        .bind(page_size)
        .bind((page - 1).saturating_mul(page_size))
        .fetch_all(self.pool)
        .await?;

        debug!(count = products.len(), total, "Catalog search");
        Ok((products, total))
    }

    /// Highest-rated products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY rating DESC, num_reviews DESC, id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Distinct non-empty categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            "SELECT DISTINCT category FROM product WHERE category <> '' ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Get the products with the given IDs. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Whether a product with exactly this name exists (used by seeding).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM product WHERE name = $1)")
            .bind(name)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        user_id: Option<UserId>,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO product
                (user_id, name, image, brand, category, description, price, count_in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.image)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.count_in_stock)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE product SET
                name = $2, image = $3, brand = $4, category = $5, description = $6,
                price = $7, count_in_stock = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.image)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.count_in_stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Order items keep their snapshot with a null
    /// product reference.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT id, product_id, user_id, name, rating, comment, created_at
            FROM review
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Add a review and recompute the product's rating and review count in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the user already reviewed it.
    #[instrument(skip(self, name, comment))]
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        name: &str,
        rating: Rating,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM product WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let review = sqlx::query_as::<_, Review>(
            r"
            INSERT INTO review (product_id, user_id, name, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, user_id, name, rating, comment, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(name)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "Product already reviewed"))?;

        sqlx::query(
            r"
            UPDATE product SET
                num_reviews = stats.n,
                rating = stats.avg,
                updated_at = NOW()
            FROM (
                SELECT COUNT(*)::int AS n, COALESCE(ROUND(AVG(rating), 2), 0) AS avg
                FROM review WHERE product_id = $1
            ) AS stats
            WHERE product.id = $1
            ",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(review)
    }

    // =========================================================================
    // Checkout (inside a caller-owned transaction)
    // =========================================================================

    /// Lock and return the given products for the rest of the transaction.
    ///
    /// Rows are locked in id order so concurrent checkouts cannot deadlock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_checkout(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&ids)
        .fetch_all(conn)
        .await?;
        Ok(products)
    }

    /// Take `qty` units out of stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if stock would go negative.
    pub async fn decrement_stock(
        conn: &mut PgConnection,
        id: ProductId,
        qty: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product SET count_in_stock = count_in_stock - $2, updated_at = NOW()
            WHERE id = $1 AND count_in_stock >= $2
            ",
        )
        .bind(id)
        .bind(qty)
        .execute(conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "insufficient stock for product {id}"
            )));
        }
        Ok(())
    }
}
