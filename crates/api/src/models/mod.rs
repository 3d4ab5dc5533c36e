//! Domain models for the API.
//!
//! These are the shapes handlers return to clients and repositories build
//! from rows. Request payloads that need validation live next to the model
//! they produce.

pub mod audit;
pub mod deal;
pub mod order;
pub mod product;
pub mod settings;
pub mod user;

use serde::Serialize;

pub use audit::{AuditEntry, NewAuditEntry};
pub use deal::{Deal, DealInput, LiveDeal};
pub use order::{Order, OrderItem, PaymentResult};
pub use product::{Product, ProductInput, Review, ReviewInput};
pub use settings::{PublicSettings, StoreInfo};
pub use user::{CurrentUser, User};

/// Number of pages needed to show `total` rows, never less than one.
#[must_use]
pub fn page_count(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 1;
    }
    (total + page_size - 1) / page_size
}

/// Clamp a client-supplied page number to `>= 1`.
#[must_use]
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(flatten)]
    pub rows: T,
    pub page: i64,
    pub pages: i64,
}
