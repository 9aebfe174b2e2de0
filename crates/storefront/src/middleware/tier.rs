//! Per-request tier resolution.
//!
//! The pricing tier is derived from a fresh user-record read on every
//! request, never cached in the session. A business account whose
//! verification status flips mid-session sees the new tier on its very
//! next request.

use axum::{extract::FromRequestParts, http::request::Parts};

use meridian_core::UserTier;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::middleware::auth::OptionalAuth;
use crate::state::AppState;

/// Extractor resolving the caller's pricing tier.
///
/// Anonymous requests resolve to [`UserTier::Guest`]. Authenticated requests
/// re-read the user row so account type and verification status are current.
/// A session pointing at a deleted user degrades to guest rather than
/// failing the request.
pub struct CurrentTier(pub UserTier);

impl FromRequestParts<AppState> for CurrentTier {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(current) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));

        let Some(current) = current else {
            return Ok(Self(UserTier::Guest));
        };

        let users = UserRepository::new(state.pool());
        let tier = match users.get_by_id(current.id).await? {
            Some(user) => user.tier(),
            None => UserTier::Guest,
        };

        Ok(Self(tier))
    }
}
