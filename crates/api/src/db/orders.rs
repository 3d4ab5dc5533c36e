//! Order repository.
//!
//! Orders are inserted once and afterwards only their payment and delivery
//! columns change (the database triggers reject anything else).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use bazaar_core::{
    Money, OrderEvent, OrderId, OrderStatus, PaymentMethod, PriceBreakdown, ProductId,
    ShippingAddress, TransitionError, UserId,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, PaymentResult};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, u.name AS user_name, o.shipping_address, o.payment_method,
           o.items_price, o.shipping_price, o.tax_price, o.total_price,
           o.is_paid, o.paid_at, o.payment_result, o.is_delivered, o.delivered_at,
           o.created_at
    FROM shop_order o
    LEFT JOIN shop_user u ON u.id = o.user_id
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    user_name: Option<String>,
    shipping_address: Json<ShippingAddress>,
    payment_method: PaymentMethod,
    items_price: Money,
    shipping_price: Money,
    tax_price: Money,
    total_price: Money,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_result: Option<Json<PaymentResult>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            items,
            shipping_address: self.shipping_address.0,
            payment_method: self.payment_method,
            items_price: self.items_price,
            shipping_price: self.shipping_price,
            tax_price: self.tax_price,
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            payment_result: self.payment_result.map(|j| j.0),
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    order_id: OrderId,
    #[sqlx(flatten)]
    item: OrderItem,
}

/// Snapshot of one line to store with a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub list_price: Money,
    pub unit_price: Money,
    pub qty: i32,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder<'k> {
    pub user_id: UserId,
    pub idempotency_key: Option<&'k str>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub prices: PriceBreakdown,
    pub items: Vec<NewOrderItem>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::get_with(&mut *conn, id).await
    }

    /// The order a user already placed under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_idempotency_key(
        &self,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let id: Option<OrderId> = sqlx::query_scalar(
            "SELECT id FROM shop_order WHERE user_id = $1 AND idempotency_key = $2",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(self.pool)
        .await?;
        match id {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        self.attach_items(rows).await
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} ORDER BY o.created_at DESC, o.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        self.attach_items(rows).await
    }

    /// Record a payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist. A
    /// payment the current status rejects comes back as the inner `Err`.
    #[instrument(skip(self, result))]
    pub async fn mark_paid(
        &self,
        id: OrderId,
        result: &PaymentResult,
    ) -> Result<Result<Order, TransitionError>, RepositoryError> {
        self.transition(id, OrderEvent::Pay, Some(result)).await
    }

    /// Record delivery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        id: OrderId,
    ) -> Result<Result<Order, TransitionError>, RepositoryError> {
        self.transition(id, OrderEvent::Deliver, None).await
    }

    /// Apply a status event under a row lock, so two concurrent payments
    /// cannot both succeed.
    async fn transition(
        &self,
        id: OrderId,
        event: OrderEvent,
        result: Option<&PaymentResult>,
    ) -> Result<Result<Order, TransitionError>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let flags: Option<(bool, bool)> = sqlx::query_as(
            "SELECT is_paid, is_delivered FROM shop_order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let (is_paid, is_delivered) = flags.ok_or(RepositoryError::NotFound)?;

        if let Err(e) = OrderStatus::from_flags(is_paid, is_delivered).apply(event) {
            return Ok(Err(e));
        }

        match event {
            OrderEvent::Pay => {
                sqlx::query(
                    r"
                    UPDATE shop_order
                    SET is_paid = TRUE, paid_at = NOW(), payment_result = $2
                    WHERE id = $1
                    ",
                )
                .bind(id)
                .bind(result.map(Json))
                .execute(&mut *tx)
                .await?;
            }
            OrderEvent::Deliver => {
                sqlx::query(
                    "UPDATE shop_order SET is_delivered = TRUE, delivered_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let order = Self::get_with(&mut *tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        info!(order_id = %id, ?event, "Order status changed");
        Ok(Ok(order))
    }

    // =========================================================================
    // Checkout (inside a caller-owned transaction)
    // =========================================================================

    /// Insert an order and its item snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the idempotency key was already
    /// used by this user.
    pub async fn insert(
        conn: &mut PgConnection,
        order: &NewOrder<'_>,
    ) -> Result<OrderId, RepositoryError> {
        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO shop_order
                (user_id, idempotency_key, shipping_address, payment_method,
                 items_price, shipping_price, tax_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(order.user_id)
        .bind(order.idempotency_key)
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method)
        .bind(order.prices.items)
        .bind(order.prices.shipping)
        .bind(order.prices.tax)
        .bind(order.prices.total)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "duplicate idempotency key"))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_item
                    (order_id, product_id, name, image, list_price, unit_price, qty)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(&item.image)
            .bind(item.list_price)
            .bind(item.unit_price)
            .bind(item.qty)
            .execute(&mut *conn)
            .await?;
        }

        Ok(id)
    }

    /// Load one order using an existing connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, product_id, name, image, list_price, unit_price, qty
            FROM order_item WHERE order_id = $1 ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(row.into_order(items)))
    }

    /// Fetch items for many orders in one query and attach them.
    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let items = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT order_id, id, product_id, name, image, list_price, unit_price, qty
            FROM order_item WHERE order_id = ANY($1) ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in items {
            by_order.entry(row.order_id).or_default().push(row.item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}
