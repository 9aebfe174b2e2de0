//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting (governor)

pub mod auth;
pub mod guest;
pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod tier;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use guest::GuestSession;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use tier::CurrentTier;
