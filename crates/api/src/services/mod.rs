//! Business logic that spans more than one repository.
//!
//! # Services
//!
//! - `auth` - Registration, login, JWT issue/verify, logout
//! - `blacklist` - Revoked-token lookups with an in-memory cache
//! - `checkout` - Cart quotes and transactional order placement
//! - `settings` - Cached public settings and admin updates
//! - `uploads` - Product image validation and storage
//! - `audit` - Admin audit trail

pub mod audit;
pub mod auth;
pub mod blacklist;
pub mod checkout;
pub mod settings;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use blacklist::TokenBlacklist;
pub use checkout::{CheckoutError, CheckoutService, Quote};
pub use settings::SiteSettings;
pub use uploads::{StoredImage, UploadError};
