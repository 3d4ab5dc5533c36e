//! Client-side shopping cart state.
//!
//! The cart lives in the shopper's browser (local storage) until checkout. It
//! is serialized as a versioned camelCase JSON document; [`Cart::from_json`]
//! never fails, so a corrupt or outdated stored value degrades to an empty
//! cart instead of blocking the storefront.

use serde::{Deserialize, Serialize};

use crate::pricing::{PriceBreakdown, PricingPolicy};
use crate::types::{Money, PaymentMethod, ProductId, ShippingAddress};
use crate::validation::ValidationError;

/// Current on-disk cart format.
pub const CART_VERSION: u32 = 1;

/// Upper bound on a single line's quantity regardless of stock.
pub const MAX_LINE_QTY: u32 = 99;

/// One product in the cart with the price seen when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    /// Price snapshot (deal price if a deal was live).
    pub unit_price: Money,
    pub qty: u32,
    /// Stock level at the time the line was added; bounds `qty`.
    pub count_in_stock: u32,
}

impl CartLine {
    /// Largest quantity this line may hold.
    #[must_use]
    pub fn max_qty(&self) -> u32 {
        self.count_in_stock.min(MAX_LINE_QTY)
    }

    /// `unit_price x qty`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.qty)
    }
}

/// The shopper's cart plus the checkout details collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub version: u32,
    pub items: Vec<CartLine>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            version: CART_VERSION,
            items: Vec::new(),
            shipping_address: None,
            payment_method: None,
        }
    }
}

fn check_qty(qty: u32, max: u32) -> Result<(), ValidationError> {
    if max == 0 {
        return Err(ValidationError::new("qty", "product is out of stock"));
    }
    if qty == 0 || qty > max {
        return Err(ValidationError::new(
            "qty",
            format!("must be between 1 and {max}"),
        ));
    }
    Ok(())
}

impl Cart {
    /// Add a line. Adding a product that is already in the cart replaces
    /// its line, so the quantity is set rather than accumulated.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the product is out of stock, `qty`
    /// is outside `1..=max_qty`, or the price is out of range.
    pub fn add_item(&mut self, line: CartLine) -> Result<(), ValidationError> {
        if !line.unit_price.is_storable() {
            return Err(ValidationError::new("unitPrice", "is out of range"));
        }
        check_qty(line.qty, line.max_qty())?;
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => *existing = line,
            None => self.items.push(line),
        }
        Ok(())
    }

    /// Change a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the product is not in the cart or
    /// `qty` exceeds the line's maximum.
    pub fn update_qty(&mut self, product_id: ProductId, qty: u32) -> Result<(), ValidationError> {
        if qty == 0 {
            return if self.remove_item(product_id) {
                Ok(())
            } else {
                Err(ValidationError::new("productId", "is not in the cart"))
            };
        }
        let line = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| ValidationError::new("productId", "is not in the cart"))?;
        check_qty(qty, line.max_qty())?;
        line.qty = qty;
        Ok(())
    }

    /// Remove a product's line. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Empty the cart after a successful checkout, keeping the address and
    /// payment method for the next order.
    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.qty).sum()
    }

    /// Totals under `policy`.
    #[must_use]
    pub fn breakdown(&self, policy: &PricingPolicy) -> PriceBreakdown {
        policy.price(self.items.iter().map(|line| (line.unit_price, line.qty)))
    }

    /// Serialize for local storage.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; this does not happen for well-formed carts.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a stored cart.
    ///
    /// Unknown versions and unparsable input yield an empty cart. Lines that
    /// survived parsing have their quantity clamped to what they may hold.
    /// Lines that can no longer hold anything, or whose price is negative or
    /// above [`Money::MAX`], are dropped.
    #[must_use]
    pub fn from_json(stored: &str) -> Self {
        let Ok(mut cart) = serde_json::from_str::<Self>(stored) else {
            return Self::default();
        };
        if cart.version != CART_VERSION {
            return Self::default();
        }
        cart.items
            .retain(|line| line.max_qty() > 0 && line.qty > 0 && line.unit_price.is_storable());
        for line in &mut cart.items {
            line.qty = line.qty.min(line.max_qty());
        }
        cart
    }
}
