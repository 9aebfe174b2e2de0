//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/register          - Create an account (signs in, merges guest data)
//! POST /auth/login             - Sign in (merges guest data)
//! POST /auth/logout            - Sign out
//!
//! # Pricing
//! GET  /pricing/permissions    - Caller's tier and permission bundle
//!
//! # Cart
//! GET    /cart                 - Cart with items
//! POST   /cart/items           - Add item (mints guest cookie if needed)
//! PATCH  /cart/items           - Set item quantity (0 removes)
//! DELETE /cart/items           - Remove item
//! GET    /cart/count           - Item count badge
//! POST   /checkout             - Begin checkout (tier-gated, auth required)
//!
//! # Wishlist
//! GET    /wishlist             - Wishlist with items
//! POST   /wishlist/items       - Save item (mints guest cookie if needed)
//! DELETE /wishlist/items       - Remove item
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod pricing;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route(
            "/items",
            post(cart::add_item)
                .patch(cart::update_item)
                .delete(cart::remove_item),
        )
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new().route("/", get(wishlist::show)).route(
        "/items",
        post(wishlist::save_item).delete(wishlist::remove_item),
    )
}

/// Create all routes for the storefront.
///
/// Auth endpoints carry a strict per-IP rate limit; the shopping surface a
/// relaxed one. Health checks are unlimited so orchestrator probes never
/// get throttled.
pub fn routes() -> Router<AppState> {
    let shopping = Router::new()
        .route("/pricing/permissions", get(pricing::permissions))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/wishlist", wishlist_routes())
        .layer(crate::middleware::api_rate_limiter());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .merge(shopping)
        .nest(
            "/auth",
            auth_routes().layer(crate::middleware::auth_rate_limiter()),
        )
}
