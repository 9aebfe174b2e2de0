//! Cart route handlers.
//!
//! Carts work for every tier: anonymous shoppers get a guest cart keyed by
//! the guest cookie, signed-in users get their persistent cart. Checkout is
//! the only purchase-gated step; adding to a cart never is, because guest
//! carts are what the sign-in merge consolidates.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use meridian_core::{CurrencyCode, Price, ProductId, UserTier, VariantId, pricing};

use crate::db::carts::CartRepository;
use crate::error::AppError;
use crate::middleware::guest::{GuestSession, issue_guest_cookie};
use crate::middleware::{CurrentTier, OptionalAuth, RequireAuth};
use crate::models::collection::{Cart, CartItem};
use crate::state::AppState;

/// Cart payload with its items.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub total_quantity: i64,
    pub subtotal: Price,
}

/// Empty-cart payload for callers with no cart yet.
#[derive(Debug, Serialize)]
pub struct EmptyCartResponse {
    pub items: Vec<CartItem>,
    pub total_quantity: i64,
    pub subtotal: Price,
}

/// Sum of quantity times unit-price snapshot across all lines.
///
/// The storefront prices in a single currency, so the subtotal carries the
/// default currency code.
fn subtotal(items: &[CartItem]) -> Price {
    let amount = items
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum();
    Price::new(amount, CurrencyCode::default())
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Unit price snapshot from the catalog, captured at add time.
    pub unit_price: Decimal,
}

const fn default_quantity() -> i32 {
    1
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub variant_id: VariantId,
    /// New absolute quantity; zero removes the line.
    pub quantity: i32,
}

/// Item removal request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub variant_id: VariantId,
}

/// Cart count payload.
#[derive(Debug, Serialize)]
pub struct CartCountResponse {
    pub count: i64,
}

/// Resolve the caller's cart without creating one.
async fn find_cart(
    state: &AppState,
    auth: &OptionalAuth,
    guest: Option<Uuid>,
) -> Result<Option<Cart>, AppError> {
    let carts = CartRepository::new(state.pool());

    if let OptionalAuth(Some(user)) = auth {
        return Ok(Some(carts.ensure_user_cart(user.id).await?));
    }
    if let Some(session_id) = guest {
        return Ok(carts.find_guest_cart(session_id).await?);
    }
    Ok(None)
}

/// Get the current cart with its items.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
) -> Result<Response, AppError> {
    let Some(cart) = find_cart(&state, &auth, guest).await? else {
        return Ok(Json(EmptyCartResponse {
            items: Vec::new(),
            total_quantity: 0,
            subtotal: Price::new(Decimal::ZERO, CurrencyCode::default()),
        })
        .into_response());
    };

    let carts = CartRepository::new(state.pool());
    let items = carts.items(cart.id).await?;
    let total_quantity = carts.total_quantity(cart.id).await?;
    let subtotal = subtotal(&items);

    Ok(Json(CartResponse {
        cart,
        items,
        total_quantity,
        subtotal,
    })
    .into_response())
}

/// Add an item to the cart.
///
/// Anonymous callers without a guest cookie get one minted here; the
/// `Set-Cookie` header rides back on the response.
#[instrument(skip(state, auth))]
pub async fn add_item(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
    Json(body): Json<AddItemRequest>,
) -> Result<Response, AppError> {
    if body.quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be positive".into()));
    }

    let carts = CartRepository::new(state.pool());

    let (cart, minted_session) = if let OptionalAuth(Some(user)) = &auth {
        (carts.ensure_user_cart(user.id).await?, None)
    } else {
        let (session_id, minted) =
            guest.map_or_else(|| (Uuid::new_v4(), true), |id| (id, false));
        let cart = carts.ensure_guest_cart(session_id).await?;
        (cart, minted.then_some(session_id))
    };

    let item = carts
        .add_item(
            cart.id,
            body.product_id,
            body.variant_id,
            body.quantity,
            body.unit_price,
        )
        .await?;

    let response = (StatusCode::CREATED, Json(item));
    match minted_session {
        Some(session_id) => {
            let cookie = issue_guest_cookie(session_id, state.config().is_secure());
            Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), response).into_response())
        }
        None => Ok(response.into_response()),
    }
}

/// Set an item's quantity (zero removes it).
#[instrument(skip(state, auth))]
pub async fn update_item(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
    Json(body): Json<UpdateItemRequest>,
) -> Result<StatusCode, AppError> {
    if body.quantity < 0 {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    let Some(cart) = find_cart(&state, &auth, guest).await? else {
        return Err(AppError::NotFound("cart".into()));
    };

    let carts = CartRepository::new(state.pool());
    carts
        .set_item_quantity(cart.id, body.variant_id, body.quantity)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("variant {} in cart", body.variant_id))
            }
            other => other.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove an item from the cart.
#[instrument(skip(state, auth))]
pub async fn remove_item(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
    Json(body): Json<RemoveItemRequest>,
) -> Result<StatusCode, AppError> {
    let Some(cart) = find_cart(&state, &auth, guest).await? else {
        return Err(AppError::NotFound("cart".into()));
    };

    let carts = CartRepository::new(state.pool());
    let removed = carts.remove_item(cart.id, body.variant_id).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "variant {} in cart",
            body.variant_id
        )))
    }
}

/// Get the cart item count (for the header badge).
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
) -> Result<Json<CartCountResponse>, AppError> {
    let Some(cart) = find_cart(&state, &auth, guest).await? else {
        return Ok(Json(CartCountResponse { count: 0 }));
    };

    let carts = CartRepository::new(state.pool());
    let count = carts.total_quantity(cart.id).await?;
    Ok(Json(CartCountResponse { count }))
}

/// Checkout acknowledgment payload.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub total_quantity: i64,
    pub subtotal: Price,
}

/// Begin checkout for the signed-in user's cart.
///
/// This is the purchase gate: the caller's tier must permit buying.
/// Unverified business accounts and individual shoppers are told what
/// unblocks them via the tier's status message.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    CurrentTier(tier): CurrentTier,
) -> Result<Json<CheckoutResponse>, AppError> {
    if !pricing::can_checkout(tier) {
        let message = pricing::resolve(tier).status_message;
        return Err(AppError::Forbidden(message.to_string()));
    }
    debug_assert_ne!(tier, UserTier::Guest);

    let carts = CartRepository::new(state.pool());
    let cart = carts.ensure_user_cart(user.id).await?;
    let items = carts.items(cart.id).await?;
    if items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }
    let total_quantity = carts.total_quantity(cart.id).await?;
    let subtotal = subtotal(&items);

    Ok(Json(CheckoutResponse {
        cart,
        items,
        total_quantity,
        subtotal,
    }))
}
