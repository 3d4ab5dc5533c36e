//! Bazaar Core - Shared domain library.
//!
//! This crate provides the rules that the storefront client and the API server
//! must agree on:
//! - `api` - REST server that persists orders
//! - `cli` - Command-line tools for migrations and seeding
//! - the browser client, which keeps the cart in local storage
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The optional `postgres` feature adds `sqlx` encode/decode
//! implementations for the newtypes.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, ratings, and roles
//! - [`pricing`] - Item/shipping/tax/total computation
//! - [`cart`] - Persisted client cart state
//! - [`deal`] - Daily-deal discounts and countdown arithmetic
//! - [`order`] - Order status transitions
//! - [`validation`] - Field-level validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod deal;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine};
pub use deal::{Countdown, DealWindow};
pub use order::{OrderEvent, OrderStatus, TransitionError};
pub use pricing::{PriceBreakdown, PricingPolicy};
pub use types::*;
pub use validation::ValidationError;
