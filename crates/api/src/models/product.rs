//! Catalog types: products and their reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::validation::required_text;
use bazaar_core::{Money, ProductId, Rating, ReviewId, UserId, ValidationError};

use super::deal::ProductDeal;

const MAX_NAME_LENGTH: usize = 200;
const MAX_TEXT_LENGTH: usize = 5_000;
const MAX_COMMENT_LENGTH: usize = 2_000;

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Admin who created the product.
    pub user_id: Option<UserId>,
    pub name: String,
    pub image: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: Money,
    pub count_in_stock: i32,
    /// Mean review rating, 0 when unreviewed.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Reviewer's display name at the time of review.
    pub name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Product detail page payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
    /// The product's deal, present only while it is live.
    pub deal: Option<ProductDeal>,
    /// Whether the caller has already reviewed this product.
    pub reviewed: bool,
}

/// Admin create/update payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub count_in_stock: i32,
}

impl ProductInput {
    /// Trim text fields and check ranges.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = required_text("name", &self.name, MAX_NAME_LENGTH)?;
        if self.price.is_negative() {
            return Err(ValidationError::new("price", "cannot be negative"));
        }
        if self.price > Money::MAX {
            return Err(ValidationError::new(
                "price",
                format!("must be at most {}", Money::MAX),
            ));
        }
        if self.count_in_stock < 0 {
            return Err(ValidationError::new("countInStock", "cannot be negative"));
        }
        let description = self.description.trim().to_owned();
        if description.chars().count() > MAX_TEXT_LENGTH {
            return Err(ValidationError::new(
                "description",
                format!("must be at most {MAX_TEXT_LENGTH} characters"),
            ));
        }
        Ok(Self {
            name,
            image: self.image.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            category: self.category.trim().to_owned(),
            description,
            price: self.price,
            count_in_stock: self.count_in_stock,
        })
    }
}

/// Review submission payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    pub comment: String,
}

impl ReviewInput {
    /// Check the rating range and require a comment.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validated(&self) -> Result<(Rating, String), ValidationError> {
        let rating = Rating::new(self.rating)?;
        let comment = required_text("comment", &self.comment, MAX_COMMENT_LENGTH)?;
        Ok((rating, comment))
    }
}

/// Catalog search filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
}

impl ProductQuery {
    /// Keyword with surrounding whitespace removed; blank means no filter.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Category with surrounding whitespace removed; blank means no filter.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Airpods ".to_string(),
            image: "/uploads/a.png".to_string(),
            brand: "Apple".to_string(),
            category: "Electronics".to_string(),
            description: "Wireless".to_string(),
            price: Money::from_cents(8999),
            count_in_stock: 10,
        }
    }

    #[test]
    fn test_product_input_trims() {
        let valid = input().validated().unwrap();
        assert_eq!(valid.name, "Airpods");
    }

    #[test]
    fn test_product_input_rejects_bad_values() {
        let err = ProductInput {
            name: " ".to_string(),
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field, "name");

        let err = ProductInput {
            price: Money::from_cents(-1),
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field, "price");

        let err = ProductInput {
            count_in_stock: -1,
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field, "countInStock");
    }

    #[test]
    fn test_product_input_rejects_unstorable_price() {
        let err = ProductInput {
            price: "10000000000.00".parse().unwrap(),
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field, "price");

        let ok = ProductInput {
            price: Money::MAX,
            ..input()
        }
        .validated();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_review_input() {
        let review = ReviewInput {
            rating: 6,
            comment: "great".to_string(),
        };
        assert_eq!(review.validated().unwrap_err().field, "rating");

        let review = ReviewInput {
            rating: 4,
            comment: "  ".to_string(),
        };
        assert_eq!(review.validated().unwrap_err().field, "comment");
    }

    #[test]
    fn test_query_blank_filters_are_ignored() {
        let query = ProductQuery {
            keyword: Some("  ".to_string()),
            category: Some(" Books ".to_string()),
            page: None,
        };
        assert_eq!(query.keyword(), None);
        assert_eq!(query.category(), Some("Books"));
    }
}
