//! Cart quoting and order placement.
//!
//! Both paths price lines the same way: the catalog price, discounted by the
//! product's deal while it is live, totalled by [`PricingPolicy::price`].
//! Client-sent prices are never used.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use bazaar_core::{
    DealId, Money, PriceBreakdown, PricingPolicy, ProductId, UserId, ValidationError,
};

use crate::db::orders::{NewOrder, NewOrderItem};
use crate::db::{DealRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::deal::Deal;
use crate::models::order::{CreateOrderRequest, LineRequest, Order, normalize_lines};
use crate::models::product::Product;

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("only {available} of {name} in stock")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
    },

    #[error("order total changed from {expected} to {actual}; please review your cart")]
    TotalMismatch { expected: Money, actual: Money },
}

/// A priced line of a quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub list_price: Money,
    pub unit_price: Money,
    /// Live deal applied to `unit_price`, if any.
    pub deal_id: Option<DealId>,
    /// Quantity priced, clamped to stock.
    pub qty: u32,
    /// Units in stock.
    pub available: i32,
    /// Whether `qty` was lowered to fit stock.
    pub adjusted: bool,
    pub line_total: Money,
}

/// Server-side price of a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<QuotedLine>,
    /// Requested products that no longer exist.
    pub missing: Vec<ProductId>,
    pub prices: PriceBreakdown,
    pub pricing: PricingPolicy,
}

/// Price charged for `product` at `now`.
fn unit_price(product: &Product, deal: Option<&Deal>, now: DateTime<Utc>) -> (Money, Option<DealId>) {
    match deal {
        Some(deal) if deal.window().is_live(now) => (deal.window().apply(product.price), Some(deal.id)),
        _ => (product.price, None),
    }
}

/// Index active deals by product.
fn deals_by_product(deals: Vec<Deal>) -> HashMap<ProductId, Deal> {
    deals.into_iter().map(|d| (d.product_id, d)).collect()
}

/// Price requested lines against the catalog. Lines are clamped to stock so
/// the client can show what is actually purchasable.
#[must_use]
pub fn price_lines(
    lines: &[LineRequest],
    products: &[Product],
    deals: &HashMap<ProductId, Deal>,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
) -> Quote {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut quoted = Vec::with_capacity(lines.len());
    let mut missing = Vec::new();

    for line in lines {
        let Some(product) = by_id.get(&line.product_id) else {
            missing.push(line.product_id);
            continue;
        };
        let (unit, deal_id) = unit_price(product, deals.get(&product.id), now);
        let available = product.count_in_stock.max(0);
        let qty = line.qty.min(u32::try_from(available).unwrap_or(0));
        quoted.push(QuotedLine {
            product_id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            list_price: product.price,
            unit_price: unit,
            deal_id,
            qty,
            available,
            adjusted: qty != line.qty,
            line_total: unit.times(qty),
        });
    }

    let prices = policy.price(quoted.iter().map(|l| (l.unit_price, l.qty)));
    Quote {
        lines: quoted,
        missing,
        prices,
        pricing: *policy,
    }
}

/// Cart quoting and order placement.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    policy: PricingPolicy,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: PricingPolicy) -> Self {
        Self { pool, policy }
    }

    /// Price a cart without reserving anything.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` for a zero quantity and
    /// `CheckoutError::Repository` if a lookup fails.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn quote(&self, lines: &[LineRequest]) -> Result<Quote, CheckoutError> {
        if lines.is_empty() {
            return Ok(price_lines(&[], &[], &HashMap::new(), &self.policy, Utc::now()));
        }
        let lines = normalize_lines(lines)?;
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();

        let products = ProductRepository::new(self.pool).get_many(&ids).await?;
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        let deals = DealRepository::active_for_products(&mut *conn, &ids).await?;

        Ok(price_lines(
            &lines,
            &products,
            &deals_by_product(deals),
            &self.policy,
            Utc::now(),
        ))
    }

    /// Place an order in one transaction.
    ///
    /// Returns the order and whether it was newly created; a retry with an
    /// `idempotency_key` already used by this user returns the original
    /// order instead of charging twice.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`].
    #[instrument(skip(self, request, idempotency_key))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &CreateOrderRequest,
        idempotency_key: Option<&str>,
    ) -> Result<(Order, bool), CheckoutError> {
        let shipping_address = request.shipping_address.validated()?;
        let lines = normalize_lines(&request.items)?;
        let orders = OrderRepository::new(self.pool);

        if let Some(key) = idempotency_key
            && let Some(existing) = orders.find_by_idempotency_key(user_id, key).await?
        {
            info!(order_id = %existing.id, "Idempotent replay");
            return Ok((existing, false));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();

        let products = ProductRepository::lock_for_checkout(&mut *tx, &ids).await?;
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
        for line in &lines {
            let product = by_id
                .get(&line.product_id)
                .ok_or(CheckoutError::UnknownProduct(line.product_id))?;
            if i64::from(line.qty) > i64::from(product.count_in_stock) {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    available: product.count_in_stock,
                });
            }
        }

        let deals = deals_by_product(DealRepository::active_for_products(&mut *tx, &ids).await?);
        let now = Utc::now();
        let quote = price_lines(&lines, &products, &deals, &self.policy, now);

        if let Some(expected) = request.expected_total
            && expected != quote.prices.total
        {
            warn!(%expected, actual = %quote.prices.total, "Checkout total mismatch");
            return Err(CheckoutError::TotalMismatch {
                expected,
                actual: quote.prices.total,
            });
        }

        if !quote.prices.total.is_storable() {
            return Err(ValidationError::new("items", "order total is out of range").into());
        }

        let items = quote
            .lines
            .iter()
            .map(|l| NewOrderItem {
                product_id: l.product_id,
                name: l.name.clone(),
                image: l.image.clone(),
                list_price: l.list_price,
                unit_price: l.unit_price,
                // Stock was checked above, so qty fits in an i32.
                qty: i32::try_from(l.qty).unwrap_or(i32::MAX),
            })
            .collect::<Vec<_>>();

        let new_order = NewOrder {
            user_id,
            idempotency_key,
            shipping_address,
            payment_method: request.payment_method,
            prices: quote.prices,
            items,
        };

        let order_id = match OrderRepository::insert(&mut *tx, &new_order).await {
            Ok(id) => id,
            Err(RepositoryError::Conflict(_)) if idempotency_key.is_some() => {
                // A concurrent request with the same key committed first.
                drop(tx);
                let key = idempotency_key.unwrap_or_default();
                let existing = orders
                    .find_by_idempotency_key(user_id, key)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                return Ok((existing, false));
            }
            Err(e) => return Err(e.into()),
        };

        for item in &new_order.items {
            ProductRepository::decrement_stock(&mut *tx, item.product_id, item.qty).await?;
        }

        let order = OrderRepository::get_with(&mut *tx, order_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            order_id = %order.id,
            total = %order.total_price,
            lines = order.items.len(),
            "Order placed"
        );
        Ok((order, true))
    }
}
