//! Meridian Core - Shared types library.
//!
//! This crate provides common types used across all Meridian components:
//! - `storefront` - Public-facing B2B storefront and JSON API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and the
//!   account tier model
//! - [`pricing`] - The tier-to-permission mapping that gates price display,
//!   checkout, and quote requests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PricingPermissions, resolve};
pub use types::*;
