//! Order types.
//!
//! An [`Order`] is a snapshot: its items carry the name, image, and prices
//! that applied at checkout, so later catalog edits never reach it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PriceBreakdown, ProductId,
    ShippingAddress, UserId, ValidationError,
};

/// Largest number of distinct lines accepted in one order.
pub const MAX_ORDER_LINES: usize = 100;

/// A placed order with its item snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    /// Customer name, when the account still exists.
    pub user_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        OrderStatus::from_flags(self.is_paid, self.is_delivered)
    }

    /// The stored totals.
    #[must_use]
    pub const fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            items: self.items_price,
            shipping: self.shipping_price,
            tax: self.tax_price,
            total: self.total_price,
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

/// One line of a placed order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub image: String,
    /// Catalog price at checkout.
    pub list_price: Money,
    /// Price charged (deal price when a deal was live).
    pub unit_price: Money,
    pub qty: i32,
}

/// Payment confirmation reported by the client.
///
/// Recorded as reported; the provider is not contacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub payment_id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

impl PaymentResult {
    /// Require a payment id and trim every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the payment id is blank.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let payment_id = bazaar_core::validation::required_text("paymentId", &self.payment_id, 200)?;
        Ok(Self {
            payment_id,
            status: self.status.trim().to_owned(),
            update_time: self.update_time.trim().to_owned(),
            email_address: self.email_address.trim().to_owned(),
        })
    }
}

/// A requested order line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: ProductId,
    pub qty: u32,
}

/// Checkout payload.
///
/// Prices are deliberately absent: the server prices every line itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<LineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Total the client displayed; a mismatch aborts checkout.
    pub expected_total: Option<Money>,
}

/// Merge duplicate product lines and check quantities.
///
/// # Errors
///
/// Returns a [`ValidationError`] for an empty order, a zero quantity, or too
/// many lines.
pub fn normalize_lines(lines: &[LineRequest]) -> Result<Vec<LineRequest>, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::new("items", "no order items"));
    }
    let mut merged: Vec<LineRequest> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.qty == 0 {
            return Err(ValidationError::new("qty", "must be at least 1"));
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.qty = existing.qty.saturating_add(line.qty),
            None => merged.push(*line),
        }
    }
    if merged.len() > MAX_ORDER_LINES {
        return Err(ValidationError::new(
            "items",
            format!("at most {MAX_ORDER_LINES} products per order"),
        ));
    }
    Ok(merged)
}
