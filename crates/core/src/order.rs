//! Order lifecycle.
//!
//! An order is immutable once placed. The only changes it accepts are the two
//! status transitions below, each applied at most once:
//!
//! ```text
//! Pending --Pay--> Paid --Deliver--> Delivered
//! ```

use serde::{Deserialize, Serialize};

/// Where an order is in its lifecycle, derived from its stored flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    Pay,
    Deliver,
}

/// A status change that the current status does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("order is already paid")]
    AlreadyPaid,
    #[error("order is already delivered")]
    AlreadyDelivered,
    #[error("order must be paid before it can be delivered")]
    NotPaid,
}

impl OrderStatus {
    /// Derive the status from an order's `is_paid` / `is_delivered` flags.
    #[must_use]
    pub const fn from_flags(is_paid: bool, is_delivered: bool) -> Self {
        match (is_paid, is_delivered) {
            (_, true) => Self::Delivered,
            (true, false) => Self::Paid,
            (false, false) => Self::Pending,
        }
    }

    /// Apply `event`, returning the new status.
    ///
    /// # Errors
    ///
    /// Paying twice, delivering twice, or delivering an unpaid order is a
    /// [`TransitionError`].
    pub const fn apply(self, event: OrderEvent) -> Result<Self, TransitionError> {
        match (self, event) {
            (Self::Pending, OrderEvent::Pay) => Ok(Self::Paid),
            (Self::Paid, OrderEvent::Deliver) => Ok(Self::Delivered),
            (Self::Paid | Self::Delivered, OrderEvent::Pay) => Err(TransitionError::AlreadyPaid),
            (Self::Delivered, OrderEvent::Deliver) => Err(TransitionError::AlreadyDelivered),
            (Self::Pending, OrderEvent::Deliver) => Err(TransitionError::NotPaid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = OrderStatus::from_flags(false, false);
        let status = status.apply(OrderEvent::Pay);
        assert_eq!(status, Ok(OrderStatus::Paid));
        assert_eq!(
            OrderStatus::Paid.apply(OrderEvent::Deliver),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn test_cannot_pay_twice() {
        assert_eq!(
            OrderStatus::Paid.apply(OrderEvent::Pay),
            Err(TransitionError::AlreadyPaid)
        );
        assert_eq!(
            OrderStatus::Delivered.apply(OrderEvent::Pay),
            Err(TransitionError::AlreadyPaid)
        );
    }

    #[test]
    fn test_delivery_requires_payment_and_happens_once() {
        assert_eq!(
            OrderStatus::Pending.apply(OrderEvent::Deliver),
            Err(TransitionError::NotPaid)
        );
        assert_eq!(
            OrderStatus::Delivered.apply(OrderEvent::Deliver),
            Err(TransitionError::AlreadyDelivered)
        );
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(OrderStatus::from_flags(true, false), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_flags(true, true), OrderStatus::Delivered);
    }
}
