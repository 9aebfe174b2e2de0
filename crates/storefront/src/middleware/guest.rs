//! Guest session cookie handling.
//!
//! Anonymous shoppers are identified by a long-lived UUID cookie, separate
//! from the authenticated session. The UUID keys guest carts and wishlists
//! in the database so they survive browser restarts and can be merged into
//! an account at sign-in.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
};
use uuid::Uuid;

/// Guest session cookie name.
pub const GUEST_COOKIE_NAME: &str = "meridian_guest";

/// Guest cookie lifetime in seconds (365 days).
const GUEST_COOKIE_MAX_AGE_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Extractor for the guest session ID, if the request carries one.
///
/// A missing or malformed cookie yields `None`; handlers that need a guest
/// identity (adding to a guest cart) mint a fresh UUID and set the cookie on
/// the response.
///
/// `Debug` is required: instrumented handlers record the extractor as a span
/// field, and the session ID is an opaque UUID that is safe to log.
#[derive(Debug, Clone, Copy)]
pub struct GuestSession(pub Option<Uuid>);

impl<S> FromRequestParts<S> for GuestSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|cookies| parse_guest_cookie(cookies));

        Ok(Self(id))
    }
}

/// Find and parse the guest cookie value in a `Cookie` header.
fn parse_guest_cookie(cookies: &str) -> Option<Uuid> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == GUEST_COOKIE_NAME {
            Uuid::parse_str(value).ok()
        } else {
            None
        }
    })
}

/// Build a `Set-Cookie` header value establishing a guest session.
///
/// # Panics
///
/// Does not panic: the formatted cookie string contains only ASCII.
#[must_use]
pub fn issue_guest_cookie(id: Uuid, secure: bool) -> HeaderValue {
    let secure_attr = if secure { "; Secure" } else { "" };
    let cookie = format!(
        "{GUEST_COOKIE_NAME}={id}; Path=/; Max-Age={GUEST_COOKIE_MAX_AGE_SECONDS}; \
         HttpOnly; SameSite=Lax{secure_attr}"
    );
    HeaderValue::from_str(&cookie).expect("guest cookie is valid ASCII")
}

/// Build a `Set-Cookie` header value that expires the guest cookie.
///
/// Sent after a successful sign-in merge so the browser stops presenting
/// the consumed guest identity.
///
/// # Panics
///
/// Does not panic: the formatted cookie string contains only ASCII.
#[must_use]
pub fn clear_guest_cookie(secure: bool) -> HeaderValue {
    let secure_attr = if secure { "; Secure" } else { "" };
    let cookie =
        format!("{GUEST_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{secure_attr}");
    HeaderValue::from_str(&cookie).expect("guest cookie is valid ASCII")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guest_cookie_finds_value() {
        let id = Uuid::new_v4();
        let header = format!("other=1; meridian_guest={id}; theme=dark");
        assert_eq!(parse_guest_cookie(&header), Some(id));
    }

    #[test]
    fn test_parse_guest_cookie_missing() {
        assert_eq!(parse_guest_cookie("other=1; theme=dark"), None);
        assert_eq!(parse_guest_cookie(""), None);
    }

    #[test]
    fn test_parse_guest_cookie_malformed_uuid() {
        assert_eq!(parse_guest_cookie("meridian_guest=not-a-uuid"), None);
    }

    #[test]
    fn test_issue_guest_cookie_attributes() {
        let id = Uuid::new_v4();
        let value = issue_guest_cookie(id, true);
        let value = value.to_str().unwrap();
        assert!(value.starts_with(&format!("meridian_guest={id}")));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));

        let insecure = issue_guest_cookie(id, false);
        assert!(!insecure.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_clear_guest_cookie_expires() {
        let value = clear_guest_cookie(false);
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }

    // Instrumented handlers record the extractor as a span field, which
    // needs the Debug impl.
    #[test]
    fn test_guest_session_debug_shows_id() {
        let id = Uuid::nil();
        let rendered = format!("{:?}", GuestSession(Some(id)));
        assert!(rendered.contains("00000000-0000-0000-0000-000000000000"));
        assert_eq!(format!("{:?}", GuestSession(None)), "GuestSession(None)");
    }
}
