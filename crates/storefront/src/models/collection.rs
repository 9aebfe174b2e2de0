//! Cart and wishlist domain types.
//!
//! Both collections share the same ownership shape: a row belongs to exactly
//! one of a user or a guest session. Items are unique per (collection,
//! variant); repeated adds increment quantity rather than duplicating rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use meridian_core::{CartId, CartItemId, ProductId, UserId, VariantId, WishlistId, WishlistItemId};

/// A shopping cart (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user, for authenticated carts.
    pub user_id: Option<UserId>,
    /// Owning guest session, for anonymous carts.
    pub session_id: Option<Uuid>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// A line item in a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Unique item ID.
    pub id: CartItemId,
    /// Cart this item belongs to.
    pub cart_id: CartId,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Specific variant being purchased.
    pub variant_id: VariantId,
    /// Quantity (always positive; zero removes the row).
    pub quantity: i32,
    /// Unit price snapshot taken when the item was added.
    pub unit_price: Decimal,
}

/// A wishlist (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Wishlist {
    /// Unique wishlist ID.
    pub id: WishlistId,
    /// Owning user, for authenticated wishlists.
    pub user_id: Option<UserId>,
    /// Owning guest session, for anonymous wishlists.
    pub session_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Whether this is the user's default wishlist (merge target).
    pub is_default: bool,
    /// When the wishlist was created.
    pub created_at: DateTime<Utc>,
}

/// A saved item in a wishlist.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    /// Unique item ID.
    pub id: WishlistItemId,
    /// Wishlist this item belongs to.
    pub wishlist_id: WishlistId,
    /// Saved product.
    pub product_id: ProductId,
    /// Saved variant.
    pub variant_id: VariantId,
    /// Optional intended quantity.
    pub quantity: i32,
    /// Free-form buyer notes.
    pub notes: Option<String>,
}
