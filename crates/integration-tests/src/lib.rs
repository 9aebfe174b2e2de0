//! Integration tests for Meridian.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! docker compose up -d postgres
//! cargo run -p meridian-cli -- migrate
//!
//! # Start the storefront
//! cargo run -p meridian-storefront
//!
//! # Run integration tests
//! cargo test -p meridian-integration-tests -- --ignored
//! ```
//!
//! Tests are `#[ignore]`d by default because they need a running server and
//! database. Each test registers its own throwaway accounts with random
//! emails so tests don't interfere with each other or need cleanup ordering.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Database URL for direct test fixtures (verification flips).
#[must_use]
pub fn database_url() -> String {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| "postgres://localhost/meridian_storefront".to_string())
}

/// Create an HTTP client with a cookie store.
///
/// The cookie store is what makes a client "one browser": it carries both
/// the session cookie and the guest cookie across requests.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Generate a unique test email.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.meridian.example", Uuid::new_v4())
}

/// Register an account and return the response body.
///
/// Registration signs the client in (the session cookie lands in the
/// client's cookie store).
///
/// # Panics
///
/// Panics if the request fails or returns a non-success status.
pub async fn register(client: &Client, email: &str, account_type: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "password": "test-password-123",
            "account_type": account_type,
        }))
        .send()
        .await
        .expect("Failed to register");

    assert!(
        resp.status().is_success(),
        "registration failed: {}",
        resp.status()
    );
    resp.json().await.expect("Failed to parse register response")
}

/// Sign in and return the response body (including any merge summary).
///
/// # Panics
///
/// Panics if the request fails or returns a non-success status.
pub async fn login(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({
            "email": email,
            "password": "test-password-123",
        }))
        .send()
        .await
        .expect("Failed to login");

    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    resp.json().await.expect("Failed to parse login response")
}

/// Sign out the client's session.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn logout(client: &Client) {
    let resp = client
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to logout");
    assert!(resp.status().is_success());
}

/// Add an item to the client's cart.
///
/// # Panics
///
/// Panics if the request fails or returns a non-success status.
pub async fn add_cart_item(client: &Client, product_id: i32, variant_id: i32, quantity: i32) {
    let resp = client
        .post(format!("{}/cart/items", base_url()))
        .json(&json!({
            "product_id": product_id,
            "variant_id": variant_id,
            "quantity": quantity,
            "unit_price": "19.99",
        }))
        .send()
        .await
        .expect("Failed to add cart item");

    assert!(
        resp.status().is_success(),
        "add to cart failed: {}",
        resp.status()
    );
}

/// Save an item to the client's wishlist.
///
/// # Panics
///
/// Panics if the request fails or returns a non-success status.
pub async fn save_wishlist_item(client: &Client, product_id: i32, variant_id: i32) {
    let resp = client
        .post(format!("{}/wishlist/items", base_url()))
        .json(&json!({
            "product_id": product_id,
            "variant_id": variant_id,
        }))
        .send()
        .await
        .expect("Failed to save wishlist item");

    assert!(
        resp.status().is_success(),
        "save to wishlist failed: {}",
        resp.status()
    );
}

/// Fetch the client's cart.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn get_cart(client: &Client) -> Value {
    let resp = client
        .get(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert!(resp.status().is_success());
    resp.json().await.expect("Failed to parse cart response")
}

/// Flip a business account's verification status directly in the database.
///
/// Verification is a back-office workflow with no storefront endpoint, so
/// tests reach into the database the same way the CLI does.
///
/// # Panics
///
/// Panics if the database is unreachable or the account doesn't exist.
pub async fn set_verified(email: &str, verified: bool) {
    let pool = sqlx::PgPool::connect(&database_url())
        .await
        .expect("Failed to connect to database");

    let status = if verified { "verified" } else { "unverified" };
    let result = sqlx::query(
        "UPDATE users SET verification_status = $1::verification_status WHERE email = $2",
    )
    .bind(status)
    .bind(email)
    .execute(&pool)
    .await
    .expect("Failed to update verification status");

    assert_eq!(result.rows_affected(), 1, "no account for {email}");
}
