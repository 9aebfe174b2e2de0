//! Pricing permission route handlers.
//!
//! Exposes the caller's resolved tier and the full permission bundle the
//! frontend needs to render price displays, CTAs, and status messaging.
//! The tier comes from a fresh user read on every request, so a
//! verification flip shows up immediately.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

use meridian_core::{PricingPermissions, UserTier, pricing};

use crate::middleware::CurrentTier;

/// Tier-and-permissions payload.
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub tier: UserTier,
    pub permissions: PricingPermissions,
}

/// Get the caller's pricing tier and permissions.
#[instrument(skip_all)]
pub async fn permissions(CurrentTier(tier): CurrentTier) -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        tier,
        permissions: pricing::resolve(tier),
    })
}
