//! Cart and order price computation.
//!
//! [`PricingPolicy::price`] is the one place totals are computed. The API uses
//! it for cart quotes and again, inside the checkout transaction, for the
//! stored order; the browser client uses the same rules (fetched from
//! `/api/settings/public`) for its local cart. All three therefore agree:
//!
//! ```text
//! items    = sum(unit_price x qty)
//! shipping = 0 if items > free_shipping_threshold, else flat_shipping_rate
//! tax      = round(tax_rate x items)
//! total    = items + shipping + tax
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;
use crate::validation::ValidationError;

/// Store-wide shipping and tax rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Orders whose item subtotal exceeds this ship free.
    pub free_shipping_threshold: Money,
    /// Shipping charged below the threshold.
    pub flat_shipping_rate: Money,
    /// Sales tax as a fraction of the item subtotal (e.g. `0.15`).
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_cents(10_000),
            flat_shipping_rate: Money::from_cents(1_000),
            tax_rate: Decimal::new(15, 2),
        }
    }
}

/// Computed totals for a set of priced lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub items: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    /// Reject negative amounts and tax rates outside `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.free_shipping_threshold.is_negative() {
            return Err(ValidationError::new(
                "freeShippingThreshold",
                "cannot be negative",
            ));
        }
        if self.flat_shipping_rate.is_negative() {
            return Err(ValidationError::new("flatShippingRate", "cannot be negative"));
        }
        if self.tax_rate.is_sign_negative() || self.tax_rate >= Decimal::ONE {
            return Err(ValidationError::new(
                "taxRate",
                "must be at least 0 and below 1",
            ));
        }
        Ok(())
    }

    /// Price `(unit_price, qty)` lines.
    ///
    /// Zero-quantity lines are ignored. An empty set of lines costs nothing,
    /// shipping included.
    #[must_use]
    pub fn price<I>(&self, lines: I) -> PriceBreakdown
    where
        I: IntoIterator<Item = (Money, u32)>,
    {
        let mut count = 0_usize;
        let items: Money = lines
            .into_iter()
            .filter(|&(_, qty)| qty > 0)
            .inspect(|_| count += 1)
            .map(|(unit_price, qty)| unit_price.times(qty))
            .sum();

        if count == 0 {
            return PriceBreakdown::default();
        }

        let shipping = if items > self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping_rate
        };
        let tax = items.percent_of(self.tax_rate);

        PriceBreakdown {
            items,
            shipping,
            tax,
            total: items + shipping + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_total_is_items_plus_shipping_plus_tax() {
        let policy = PricingPolicy::default();
        let breakdown = policy.price([(cents(2999), 2), (cents(1050), 1)]);

        assert_eq!(breakdown.items, cents(7048));
        assert_eq!(breakdown.shipping, cents(1000));
        // 15% of 70.48 = 10.572
        assert_eq!(breakdown.tax, cents(1057));
        assert_eq!(breakdown.total, cents(7048 + 1000 + 1057));
        assert_eq!(
            breakdown.total,
            breakdown.items + breakdown.shipping + breakdown.tax
        );
    }

    #[test]
    fn test_free_shipping_strictly_above_threshold() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.price([(cents(10000), 1)]).shipping, cents(1000));
        assert_eq!(policy.price([(cents(10001), 1)]).shipping, Money::ZERO);
    }

    #[test]
    fn test_empty_cart_costs_nothing() {
        let breakdown = PricingPolicy::default().price(std::iter::empty());
        assert_eq!(breakdown, PriceBreakdown::default());
    }

    #[test]
    fn test_zero_quantity_lines_do_not_count_as_a_cart() {
        let policy = PricingPolicy::default();
        let breakdown = policy.price([(cents(1000), 0), (cents(2500), 0)]);
        assert_eq!(breakdown, PriceBreakdown::default());

        let mixed = policy.price([(cents(1000), 0), (cents(2500), 1)]);
        assert_eq!(mixed.items, cents(2500));
        assert_eq!(mixed.shipping, cents(1000));
    }

    #[test]
    fn test_line_order_does_not_change_totals() {
        let policy = PricingPolicy::default();
        let a = policy.price([(cents(333), 3), (cents(1), 7)]);
        let b = policy.price([(cents(1), 7), (cents(333), 3)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate() {
        assert!(PricingPolicy::default().validate().is_ok());

        let mut bad = PricingPolicy::default();
        bad.tax_rate = Decimal::ONE;
        assert_eq!(bad.validate().map_err(|e| e.field), Err("taxRate"));

        let mut bad = PricingPolicy::default();
        bad.flat_shipping_rate = cents(-1);
        assert_eq!(
            bad.validate().map_err(|e| e.field),
            Err("flatShippingRate")
        );
    }
}
