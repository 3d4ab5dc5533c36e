//! Daily deal discounts and the countdown shown next to them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DiscountPercent, Money};

/// The time-boxed part of a deal: how much comes off and until when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealWindow {
    pub discount: DiscountPercent,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl DealWindow {
    /// A deal is live while it is switched on and has not yet ended.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.ends_at
    }

    /// Discounted price: `price - round(price x pct / 100)`.
    #[must_use]
    pub fn apply(&self, price: Money) -> Money {
        let off = price.percent_of(Decimal::new(i64::from(self.discount.get()), 2));
        price - off
    }

    /// The price to charge at `now`: discounted while live, list otherwise.
    #[must_use]
    pub fn price_at(&self, price: Money, now: DateTime<Utc>) -> Money {
        if self.is_live(now) {
            self.apply(price)
        } else {
            price
        }
    }
}

/// Remaining time until a deal ends, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

impl Countdown {
    /// Time left from `now` until `ends_at`, clamped at zero.
    #[must_use]
    pub fn until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = (ends_at - now).num_seconds();
        if remaining <= 0 {
            return Self {
                expired: true,
                ..Self::default()
            };
        }
        Self {
            days: remaining / 86_400,
            hours: remaining % 86_400 / 3_600,
            minutes: remaining % 3_600 / 60,
            seconds: remaining % 60,
            expired: false,
        }
    }

    /// Whole seconds left.
    #[must_use]
    pub const fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn window(pct: i32, ends_in: Duration, active: bool) -> DealWindow {
        DealWindow {
            discount: DiscountPercent::new(pct).unwrap(),
            ends_at: now() + ends_in,
            is_active: active,
        }
    }

    #[test]
    fn test_apply_discount() {
        let deal = window(20, Duration::hours(1), true);
        assert_eq!(deal.apply(Money::from_cents(4999)), Money::from_cents(3999));

        // 33% off 10.00 = 3.30 off
        let deal = window(33, Duration::hours(1), true);
        assert_eq!(deal.apply(Money::from_cents(1000)), Money::from_cents(670));
    }

    #[test]
    fn test_liveness() {
        assert!(window(10, Duration::seconds(1), true).is_live(now()));
        assert!(!window(10, Duration::seconds(1), false).is_live(now()));
        assert!(!window(10, Duration::zero(), true).is_live(now()));
    }

    #[test]
    fn test_price_at_falls_back_to_list_price() {
        let expired = window(50, Duration::seconds(-5), true);
        assert_eq!(
            expired.price_at(Money::from_cents(1000), now()),
            Money::from_cents(1000)
        );
    }

    #[test]
    fn test_countdown_split() {
        let ends = now() + Duration::days(1) + Duration::hours(2) + Duration::seconds(65);
        let countdown = Countdown::until(ends, now());
        assert_eq!(
            countdown,
            Countdown {
                days: 1,
                hours: 2,
                minutes: 1,
                seconds: 5,
                expired: false,
            }
        );
        assert_eq!(countdown.total_seconds(), 86_400 + 7_200 + 65);
    }

    #[test]
    fn test_countdown_clamps_when_expired() {
        let countdown = Countdown::until(now() - Duration::minutes(3), now());
        assert!(countdown.expired);
        assert_eq!(countdown.total_seconds(), 0);
    }
}
