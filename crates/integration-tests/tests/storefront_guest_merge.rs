//! Integration tests for guest cart/wishlist consolidation at sign-in.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p meridian-storefront)
//!
//! Run with: cargo test -p meridian-integration-tests -- --ignored

use meridian_integration_tests::{
    add_cart_item, client, get_cart, login, logout, register, save_wishlist_item, unique_email,
};
use serde_json::Value;

fn cart_variant_ids(cart: &Value) -> Vec<i64> {
    cart["items"]
        .as_array()
        .expect("cart items should be an array")
        .iter()
        .map(|item| item["variant_id"].as_i64().expect("variant_id"))
        .collect()
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_persists_across_requests() {
    let client = client();

    // First add mints the guest cookie; the second request must see the
    // same cart through it.
    add_cart_item(&client, 100, 1001, 2).await;
    add_cart_item(&client, 100, 1002, 1).await;

    let cart = get_cart(&client).await;
    assert_eq!(cart["total_quantity"].as_i64(), Some(3));
    assert_eq!(cart_variant_ids(&cart).len(), 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_registration_merges_guest_cart() {
    let client = client();
    let email = unique_email("merge-register");

    add_cart_item(&client, 100, 2001, 1).await;
    add_cart_item(&client, 100, 2002, 3).await;

    let body = register(&client, &email, "individual").await;
    assert_eq!(body["merged"]["items_added"].as_u64(), Some(2));
    assert_eq!(body["merged"]["items_updated"].as_u64(), Some(0));

    // The guest cart became the account cart.
    let cart = get_cart(&client).await;
    assert_eq!(cart["total_quantity"].as_i64(), Some(4));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_existing_user_item_wins_on_merge() {
    let client = client();
    let email = unique_email("merge-dedup");

    // Build the account cart first: variant 3001 at quantity 2.
    register(&client, &email, "individual").await;
    add_cart_item(&client, 100, 3001, 2).await;
    logout(&client).await;

    // Now shop as a guest: the overlapping variant plus a new one.
    add_cart_item(&client, 100, 3001, 5).await;
    add_cart_item(&client, 100, 3002, 1).await;

    let body = login(&client, &email).await;
    assert_eq!(body["merged"]["items_added"].as_u64(), Some(1));
    assert_eq!(body["merged"]["items_updated"].as_u64(), Some(1));

    // The account's quantity for the overlapping variant is untouched.
    let cart = get_cart(&client).await;
    let item_3001 = cart["items"]
        .as_array()
        .expect("items")
        .iter()
        .find(|item| item["variant_id"].as_i64() == Some(3001))
        .expect("variant 3001 should be in the cart");
    assert_eq!(item_3001["quantity"].as_i64(), Some(2));
    assert_eq!(cart_variant_ids(&cart).len(), 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_without_guest_data_merges_nothing() {
    let signup = client();
    let email = unique_email("merge-empty");
    register(&signup, &email, "individual").await;

    // A fresh client with no guest cookie at all.
    let fresh = client();
    let body = login(&fresh, &email).await;
    assert!(
        body["merged"].is_null(),
        "no guest session should mean no merge summary"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_relogin_after_merge_is_idempotent() {
    let client = client();
    let email = unique_email("merge-idem");

    add_cart_item(&client, 100, 4001, 1).await;
    let body = register(&client, &email, "individual").await;
    assert_eq!(body["merged"]["items_added"].as_u64(), Some(1));

    // The guest cookie was cleared on merge success, so a second sign-in
    // has nothing to merge and the cart is unchanged.
    logout(&client).await;
    let body = login(&client, &email).await;
    assert!(body["merged"].is_null());

    let cart = get_cart(&client).await;
    assert_eq!(cart["total_quantity"].as_i64(), Some(1));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_merges_alongside_cart() {
    let client = client();
    let email = unique_email("merge-wishlist");

    add_cart_item(&client, 100, 5001, 1).await;
    save_wishlist_item(&client, 100, 5002).await;
    save_wishlist_item(&client, 100, 5003).await;

    let body = register(&client, &email, "individual").await;
    // One cart item plus two wishlist items, summed across both merges.
    assert_eq!(body["merged"]["items_added"].as_u64(), Some(3));

    let wishlist = client
        .get(format!(
            "{}/wishlist",
            meridian_integration_tests::base_url()
        ))
        .send()
        .await
        .expect("Failed to get wishlist")
        .json::<Value>()
        .await
        .expect("Failed to parse wishlist");
    assert_eq!(
        wishlist["items"].as_array().map(Vec::len),
        Some(2),
        "both saved variants should be on the account wishlist"
    );
}
