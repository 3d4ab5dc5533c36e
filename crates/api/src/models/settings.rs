//! Site settings stored as JSON under well-known keys.

use serde::{Deserialize, Serialize};

use bazaar_core::validation::required_text;
use bazaar_core::{PricingPolicy, ValidationError};

/// Setting key for [`StoreInfo`].
pub const STORE_KEY: &str = "store";
/// Setting key for the [`PricingPolicy`].
pub const PRICING_KEY: &str = "pricing";

/// Store identity shown by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub contact_email: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        Self {
            name: "Bazaar".to_string(),
            tagline: String::new(),
            contact_email: String::new(),
        }
    }
}

impl StoreInfo {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank name or an invalid contact
    /// email.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let name = required_text("name", &self.name, 100)?;
        let contact_email = self.contact_email.trim();
        let contact_email = if contact_email.is_empty() {
            String::new()
        } else {
            bazaar_core::Email::parse(contact_email)
                .map_err(|e| ValidationError::new("contactEmail", e.to_string()))?
                .into_inner()
        };
        Ok(Self {
            name,
            tagline: self.tagline.trim().to_owned(),
            contact_email,
        })
    }
}

/// Everything the client needs to render the store and price a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub store: StoreInfo,
    pub pricing: PricingPolicy,
}

/// Admin settings update. Omitted sections are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub store: Option<StoreInfo>,
    pub pricing: Option<PricingPolicy>,
}

impl SettingsUpdate {
    /// Validate every present section before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field of either section.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let store = self.store.as_ref().map(StoreInfo::validated).transpose()?;
        if let Some(pricing) = &self.pricing {
            pricing.validate()?;
        }
        Ok(Self {
            store,
            pricing: self.pricing,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_info_validation() {
        let info = StoreInfo {
            name: " Bazaar ".to_string(),
            tagline: " Everything ".to_string(),
            contact_email: "Shop@Example.com".to_string(),
        }
        .validated()
        .unwrap();
        assert_eq!(info.name, "Bazaar");
        assert_eq!(info.contact_email, "shop@example.com");

        let bad = StoreInfo {
            contact_email: "nope".to_string(),
            ..StoreInfo::default()
        };
        assert_eq!(bad.validated().unwrap_err().field, "contactEmail");
    }

    #[test]
    fn test_update_rejects_before_writing_either_section() {
        let update = SettingsUpdate {
            store: Some(StoreInfo::default()),
            pricing: Some(PricingPolicy {
                tax_rate: rust_decimal::Decimal::ONE,
                ..PricingPolicy::default()
            }),
        };
        assert_eq!(update.validated().unwrap_err().field, "taxRate");

        let update = SettingsUpdate {
            store: Some(StoreInfo {
                name: "  Corner Shop ".to_string(),
                ..StoreInfo::default()
            }),
            pricing: None,
        };
        let valid = update.validated().unwrap();
        assert_eq!(valid.store.unwrap().name, "Corner Shop");
        assert!(valid.pricing.is_none());
    }

    #[test]
    fn test_public_settings_shape() {
        let json = serde_json::to_value(PublicSettings::default()).unwrap();
        assert_eq!(json["store"]["name"], "Bazaar");
        assert_eq!(json["pricing"]["taxRate"], "0.15");
        assert_eq!(json["pricing"]["freeShippingThreshold"], "100.00");
    }
}
