//! Authentication route handlers.
//!
//! Sign-in and registration both establish a session and then fold any guest
//! cart/wishlist into the account. The merge is best-effort from the
//! caller's point of view: a merge failure is reported to Sentry but never
//! fails the sign-in itself, and the guest data stays put for the next
//! attempt.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use meridian_core::{AccountType, UserTier};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::guest::{GuestSession, clear_guest_cookie};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::services::consolidation::{ConsolidationService, MergeSummary};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub account_type: AccountType,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User payload returned by auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub tier: UserTier,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email.to_string(),
            tier: user.tier(),
        }
    }
}

/// Response for successful sign-in or registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Present when a guest cart/wishlist merge ran and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<MergeSummary>,
}

/// Register a new account.
///
/// # Errors
///
/// Returns `AppError::Auth` for invalid input or a duplicate email.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    guest: GuestSession,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .register_with_password(&body.email, &body.password, body.account_type)
        .await?;

    let response = establish_session(&state, &session, &user, guest).await?;
    Ok((StatusCode::CREATED, response).into_response())
}

/// Sign in with email and password.
///
/// # Errors
///
/// Returns `AppError::Auth` with a 401 for bad credentials.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    guest: GuestSession,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth.login_with_password(&body.email, &body.password).await?;

    establish_session(&state, &session, &user, guest).await
}

/// Sign out.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session cannot be cleared.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("failed to flush session: {e}")))?;

    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// Store the signed-in user in the session and merge guest collections.
///
/// The merge runs after the session write so a merge failure cannot lose the
/// sign-in. On merge success the guest cookie is expired; on failure it is
/// left in place so the data merges on the next sign-in.
async fn establish_session(
    state: &AppState,
    session: &Session,
    user: &User,
    GuestSession(guest_session): GuestSession,
) -> Result<Response, AppError> {
    // Rotate the session ID at privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("failed to cycle session: {e}")))?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));

    let consolidation = ConsolidationService::new(state.pool());
    match consolidation.merge_guest_data(user.id, guest_session).await {
        Ok(summary) => {
            let body = Json(AuthResponse {
                user: user.into(),
                merged: guest_session.map(|_| summary),
            });
            if guest_session.is_some() {
                let secure = state.config().is_secure();
                Ok((
                    AppendHeaders([(header::SET_COOKIE, clear_guest_cookie(secure))]),
                    body,
                )
                    .into_response())
            } else {
                Ok(body.into_response())
            }
        }
        Err(e) => {
            // Sign-in succeeded; the guest data is intact and will merge on
            // a later attempt. Keep the cookie.
            sentry::capture_error(&e);
            tracing::warn!(error = %e, "guest merge failed during sign-in");
            Ok(Json(AuthResponse {
                user: user.into(),
                merged: None,
            })
            .into_response())
        }
    }
}
