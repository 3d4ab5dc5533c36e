//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod bounded;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use address::ShippingAddress;
pub use bounded::{DiscountPercent, Rating};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
