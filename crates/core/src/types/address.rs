//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, required_text};

/// Longest accepted value for any address line.
const MAX_FIELD_LENGTH: usize = 200;

/// Where an order ships to.
///
/// Stored on the order as part of its snapshot; editing a profile later does
/// not move an order that was already placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Return a trimmed copy, rejecting blank or oversized fields.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            address: required_text("address", &self.address, MAX_FIELD_LENGTH)?,
            city: required_text("city", &self.city, MAX_FIELD_LENGTH)?,
            postal_code: required_text("postalCode", &self.postal_code, MAX_FIELD_LENGTH)?,
            country: required_text("country", &self.country, MAX_FIELD_LENGTH)?,
        })
    }
}
