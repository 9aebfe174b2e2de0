//! Cart repository for database operations.
//!
//! A cart belongs to exactly one owner: a user (authenticated cart) or a
//! guest session (anonymous cart). The `(cart_id, variant_id)` unique
//! constraint keeps one row per variant; adds fold into quantity.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::{CartId, CartItemId, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::collection::{Cart, CartItem};
use crate::services::consolidation::CollectionStore;

/// Database row for a cart.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: Option<i32>,
    session_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Self {
            id: CartId::new(r.id),
            user_id: r.user_id.map(UserId::new),
            session_id: r.session_id,
            created_at: r.created_at,
        }
    }
}

/// Database row for a cart item.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    variant_id: i32,
    quantity: i32,
    unit_price: Decimal,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(r.id),
            cart_id: CartId::new(r.cart_id),
            product_id: ProductId::new(r.product_id),
            variant_id: VariantId::new(r.variant_id),
            quantity: r.quantity,
            unit_price: r.unit_price,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it if absent.
    ///
    /// Safe under concurrent calls: the partial unique index on `user_id`
    /// makes the insert a no-op for the loser, which then reads the winner's
    /// row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_user_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        sqlx::query(
            "INSERT INTO carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) WHERE user_id IS NOT NULL DO NOTHING",
        )
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, session_id, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get the guest session's cart, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_guest_cart(&self, session_id: Uuid) -> Result<Cart, RepositoryError> {
        sqlx::query(
            "INSERT INTO carts (session_id) VALUES ($1)
             ON CONFLICT (session_id) WHERE session_id IS NOT NULL DO NOTHING",
        )
        .bind(session_id)
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, session_id, created_at FROM carts WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Find the guest session's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_guest_cart(&self, session_id: Uuid) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, session_id, created_at FROM carts WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all items in a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, variant_id, quantity, unit_price
             FROM cart_items WHERE cart_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(cart_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a variant to a cart, folding into an existing row's quantity.
    ///
    /// The unit price snapshot of the first add wins; a later add of the same
    /// variant does not reprice the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_items (cart_id, product_id, variant_id, quantity, unit_price)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (cart_id, variant_id) DO UPDATE
                 SET quantity = cart_items.quantity + EXCLUDED.quantity,
                     updated_at = now()
             RETURNING id, cart_id, product_id, variant_id, quantity, unit_price",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(variant_id.as_i32())
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Set a line's quantity. A quantity of zero deletes the row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant isn't in the cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_item_quantity(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = if quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND variant_id = $2")
                .bind(cart_id.as_i32())
                .bind(variant_id.as_i32())
                .execute(self.pool)
                .await?
        } else {
            sqlx::query(
                "UPDATE cart_items SET quantity = $3, updated_at = now()
                 WHERE cart_id = $1 AND variant_id = $2",
            )
            .bind(cart_id.as_i32())
            .bind(variant_id.as_i32())
            .bind(quantity)
            .execute(self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a variant from a cart.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND variant_id = $2")
            .bind(cart_id.as_i32())
            .bind(variant_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total quantity across all lines in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_quantity(&self, cart_id: CartId) -> Result<i64, RepositoryError> {
        let row: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(quantity)::BIGINT FROM cart_items WHERE cart_id = $1",
        )
        .bind(cart_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.0.unwrap_or(0))
    }
}

impl CollectionStore for CartRepository<'_> {
    const KIND: &'static str = "cart";

    type Id = CartId;

    async fn ensure_user_default(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        Ok(self.ensure_user_cart(user_id).await?.id)
    }

    async fn find_guest_collection(
        &self,
        session_id: Uuid,
    ) -> Result<Option<CartId>, RepositoryError> {
        Ok(self.find_guest_cart(session_id).await?.map(|c| c.id))
    }

    async fn variant_ids(&self, collection: CartId) -> Result<HashSet<VariantId>, RepositoryError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT variant_id FROM cart_items WHERE cart_id = $1")
                .bind(collection.as_i32())
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(v,)| VariantId::new(v)).collect())
    }

    async fn reparent_items_except(
        &self,
        from: CartId,
        to: CartId,
        skip: &[VariantId],
    ) -> Result<u64, RepositoryError> {
        let skip: Vec<i32> = skip.iter().map(|v| v.as_i32()).collect();
        let result = sqlx::query(
            "UPDATE cart_items SET cart_id = $2, updated_at = now()
             WHERE cart_id = $1 AND NOT (variant_id = ANY($3))",
        )
        .bind(from.as_i32())
        .bind(to.as_i32())
        .bind(&skip)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_collection(&self, collection: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(collection.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
