//! Wishlist route handlers.
//!
//! Mirrors the cart surface: guests get a cookie-keyed wishlist, signed-in
//! users their default list. Saving an already saved variant is a no-op
//! (the first save wins), which matches the merge policy at sign-in.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use meridian_core::{ProductId, VariantId};

use crate::db::wishlists::WishlistRepository;
use crate::error::AppError;
use crate::middleware::OptionalAuth;
use crate::middleware::guest::{GuestSession, issue_guest_cookie};
use crate::models::collection::{Wishlist, WishlistItem};
use crate::state::AppState;

/// Wishlist payload with its items.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub wishlist: Wishlist,
    pub items: Vec<WishlistItem>,
}

/// Empty payload for callers with no wishlist yet.
#[derive(Debug, Serialize)]
pub struct EmptyWishlistResponse {
    pub items: Vec<WishlistItem>,
}

/// Save-item request body.
#[derive(Debug, Deserialize)]
pub struct SaveItemRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub notes: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Item removal request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub variant_id: VariantId,
}

/// Resolve the caller's wishlist without creating one.
async fn find_wishlist(
    state: &AppState,
    auth: &OptionalAuth,
    guest: Option<Uuid>,
) -> Result<Option<Wishlist>, AppError> {
    let wishlists = WishlistRepository::new(state.pool());

    if let OptionalAuth(Some(user)) = auth {
        return Ok(Some(wishlists.ensure_default_for_user(user.id).await?));
    }
    if let Some(session_id) = guest {
        return Ok(wishlists.find_guest_wishlist(session_id).await?);
    }
    Ok(None)
}

/// Get the current wishlist with its items.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
) -> Result<Response, AppError> {
    let Some(wishlist) = find_wishlist(&state, &auth, guest).await? else {
        return Ok(Json(EmptyWishlistResponse { items: Vec::new() }).into_response());
    };

    let wishlists = WishlistRepository::new(state.pool());
    let items = wishlists.items(wishlist.id).await?;

    Ok(Json(WishlistResponse { wishlist, items }).into_response())
}

/// Save an item to the wishlist.
#[instrument(skip(state, auth))]
pub async fn save_item(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
    Json(body): Json<SaveItemRequest>,
) -> Result<Response, AppError> {
    if body.quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be positive".into()));
    }

    let wishlists = WishlistRepository::new(state.pool());

    let (wishlist, minted_session) = if let OptionalAuth(Some(user)) = &auth {
        (wishlists.ensure_default_for_user(user.id).await?, None)
    } else {
        let (session_id, minted) =
            guest.map_or_else(|| (Uuid::new_v4(), true), |id| (id, false));
        let wishlist = wishlists.ensure_guest_wishlist(session_id).await?;
        (wishlist, minted.then_some(session_id))
    };

    let item = wishlists
        .add_item(
            wishlist.id,
            body.product_id,
            body.variant_id,
            body.quantity,
            body.notes.as_deref(),
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

/// Remove an item from the wishlist.
#[instrument(skip(state, auth))]
pub async fn remove_item(
    State(state): State<AppState>,
    auth: OptionalAuth,
    GuestSession(guest): GuestSession,
    Json(body): Json<RemoveItemRequest>,
) -> Result<StatusCode, AppError> {
    let Some(wishlist) = find_wishlist(&state, &auth, guest).await? else {
        return Err(AppError::NotFound("wishlist".into()));
    };

    let wishlists = WishlistRepository::new(state.pool());
    let removed = wishlists.remove_item(wishlist.id, body.variant_id).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "variant {} in wishlist",
            body.variant_id
        )))
    }
}
