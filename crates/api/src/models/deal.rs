//! Daily deal types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{
    Countdown, DealId, DealWindow, DiscountPercent, Money, ProductId, UserId, ValidationError,
};

/// A deal row as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub product_id: ProductId,
    pub discount_percent: DiscountPercent,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    #[must_use]
    pub const fn window(&self) -> DealWindow {
        DealWindow {
            discount: self.discount_percent,
            ends_at: self.ends_at,
            is_active: self.is_active,
        }
    }
}

/// Live deal attached to a product detail response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeal {
    pub id: DealId,
    pub discount_percent: DiscountPercent,
    pub deal_price: Money,
    pub ends_at: DateTime<Utc>,
    pub countdown: Countdown,
}

impl ProductDeal {
    /// Describe `deal` for a product listed at `price`, or `None` if the deal
    /// is not live at `now`.
    #[must_use]
    pub fn live(deal: &Deal, price: Money, now: DateTime<Utc>) -> Option<Self> {
        let window = deal.window();
        window.is_live(now).then(|| Self {
            id: deal.id,
            discount_percent: deal.discount_percent,
            deal_price: window.apply(price),
            ends_at: deal.ends_at,
            countdown: Countdown::until(deal.ends_at, now),
        })
    }
}

/// Product fields shown on a deal card.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DealProduct {
    #[sqlx(rename = "product_id")]
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub count_in_stock: i32,
}

/// A live deal with its product, as listed on `/api/deals`.
///
/// `server_time` lets the client correct its countdown for clock skew.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDeal {
    pub id: DealId,
    pub product: DealProduct,
    pub discount_percent: DiscountPercent,
    pub deal_price: Money,
    pub ends_at: DateTime<Utc>,
    pub server_time: DateTime<Utc>,
    pub countdown: Countdown,
}

impl LiveDeal {
    #[must_use]
    pub fn new(deal: &Deal, product: DealProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: deal.id,
            deal_price: deal.window().apply(product.price),
            product,
            discount_percent: deal.discount_percent,
            ends_at: deal.ends_at,
            server_time: now,
            countdown: Countdown::until(deal.ends_at, now),
        }
    }
}

/// Admin create/update payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    pub product_id: ProductId,
    pub discount_percent: i32,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// A deal payload that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidDeal {
    pub product_id: ProductId,
    pub discount: DiscountPercent,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl DealInput {
    /// Check the discount range, and refuse to activate a deal that has
    /// already ended.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validated(&self, now: DateTime<Utc>) -> Result<ValidDeal, ValidationError> {
        let discount = DiscountPercent::new(self.discount_percent)?;
        if self.is_active && self.ends_at <= now {
            return Err(ValidationError::new(
                "endsAt",
                "must be in the future for an active deal",
            ));
        }
        Ok(ValidDeal {
            product_id: self.product_id,
            discount,
            ends_at: self.ends_at,
            is_active: self.is_active,
        })
    }
}
