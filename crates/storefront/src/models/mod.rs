//! Domain models for the storefront.

pub mod collection;
pub mod session;
pub mod user;

pub use collection::{Cart, CartItem, Wishlist, WishlistItem};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
