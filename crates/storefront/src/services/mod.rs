//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email/password authentication
//! - `consolidation` - Guest cart/wishlist merge at sign-in

pub mod auth;
pub mod consolidation;
