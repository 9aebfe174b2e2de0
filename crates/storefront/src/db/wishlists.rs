//! Wishlist repository for database operations.
//!
//! Structurally parallel to the cart repository, with two extra affordances:
//! a display name with a fixed default, and an `is_default` flag that marks
//! the merge target among a user's wishlists.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::{ProductId, UserId, VariantId, WishlistId, WishlistItemId};

use super::RepositoryError;
use crate::models::collection::{Wishlist, WishlistItem};
use crate::services::consolidation::CollectionStore;

/// Default display name for a user's first wishlist.
pub const DEFAULT_WISHLIST_NAME: &str = "Saved items";

/// Database row for a wishlist.
#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: i32,
    user_id: Option<i32>,
    session_id: Option<Uuid>,
    name: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for Wishlist {
    fn from(r: WishlistRow) -> Self {
        Self {
            id: WishlistId::new(r.id),
            user_id: r.user_id.map(UserId::new),
            session_id: r.session_id,
            name: r.name,
            is_default: r.is_default,
            created_at: r.created_at,
        }
    }
}

/// Database row for a wishlist item.
#[derive(Debug, sqlx::FromRow)]
struct WishlistItemRow {
    id: i32,
    wishlist_id: i32,
    product_id: i32,
    variant_id: i32,
    quantity: i32,
    notes: Option<String>,
}

impl From<WishlistItemRow> for WishlistItem {
    fn from(r: WishlistItemRow) -> Self {
        Self {
            id: WishlistItemId::new(r.id),
            wishlist_id: WishlistId::new(r.wishlist_id),
            product_id: ProductId::new(r.product_id),
            variant_id: VariantId::new(r.variant_id),
            quantity: r.quantity,
            notes: r.notes,
        }
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's default wishlist, creating it if absent.
    ///
    /// Safe under concurrent calls: the partial unique index on
    /// `(user_id) WHERE is_default` makes the insert a no-op for the loser.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_default_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Wishlist, RepositoryError> {
        sqlx::query(
            "INSERT INTO wishlists (user_id, name, is_default) VALUES ($1, $2, TRUE)
             ON CONFLICT (user_id) WHERE user_id IS NOT NULL AND is_default DO NOTHING",
        )
        .bind(user_id.as_i32())
        .bind(DEFAULT_WISHLIST_NAME)
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, WishlistRow>(
            "SELECT id, user_id, session_id, name, is_default, created_at
             FROM wishlists WHERE user_id = $1 AND is_default",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get the guest session's wishlist, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_guest_wishlist(
        &self,
        session_id: Uuid,
    ) -> Result<Wishlist, RepositoryError> {
        sqlx::query(
            "INSERT INTO wishlists (session_id, name) VALUES ($1, $2)
             ON CONFLICT (session_id) WHERE session_id IS NOT NULL DO NOTHING",
        )
        .bind(session_id)
        .bind(DEFAULT_WISHLIST_NAME)
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, WishlistRow>(
            "SELECT id, user_id, session_id, name, is_default, created_at
             FROM wishlists WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Find the guest session's wishlist without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_guest_wishlist(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Wishlist>, RepositoryError> {
        let row = sqlx::query_as::<_, WishlistRow>(
            "SELECT id, user_id, session_id, name, is_default, created_at
             FROM wishlists WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all items in a wishlist, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(
        &self,
        wishlist_id: WishlistId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistItemRow>(
            "SELECT id, wishlist_id, product_id, variant_id, quantity, notes
             FROM wishlist_items WHERE wishlist_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(wishlist_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Save a variant to a wishlist.
    ///
    /// Re-saving an already saved variant leaves the existing row untouched
    /// (same policy as the merge: the first save wins).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        wishlist_id: WishlistId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<WishlistItem, RepositoryError> {
        let row = sqlx::query_as::<_, WishlistItemRow>(
            "INSERT INTO wishlist_items (wishlist_id, product_id, variant_id, quantity, notes)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (wishlist_id, variant_id) DO UPDATE
                 SET wishlist_id = wishlist_items.wishlist_id
             RETURNING id, wishlist_id, product_id, variant_id, quantity, notes",
        )
        .bind(wishlist_id.as_i32())
        .bind(product_id.as_i32())
        .bind(variant_id.as_i32())
        .bind(quantity)
        .bind(notes)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove a variant from a wishlist.
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
        wishlist_id: WishlistId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE wishlist_id = $1 AND variant_id = $2")
                .bind(wishlist_id.as_i32())
                .bind(variant_id.as_i32())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CollectionStore for WishlistRepository<'_> {
    const KIND: &'static str = "wishlist";

    type Id = WishlistId;

    async fn ensure_user_default(&self, user_id: UserId) -> Result<WishlistId, RepositoryError> {
        Ok(self.ensure_default_for_user(user_id).await?.id)
    }

    async fn find_guest_collection(
        &self,
        session_id: Uuid,
    ) -> Result<Option<WishlistId>, RepositoryError> {
        Ok(self.find_guest_wishlist(session_id).await?.map(|w| w.id))
    }

    async fn variant_ids(
        &self,
        collection: WishlistId,
    ) -> Result<HashSet<VariantId>, RepositoryError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT variant_id FROM wishlist_items WHERE wishlist_id = $1")
                .bind(collection.as_i32())
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(v,)| VariantId::new(v)).collect())
    }

    async fn reparent_items_except(
        &self,
        from: WishlistId,
        to: WishlistId,
        skip: &[VariantId],
    ) -> Result<u64, RepositoryError> {
        let skip: Vec<i32> = skip.iter().map(|v| v.as_i32()).collect();
        let result = sqlx::query(
            "UPDATE wishlist_items SET wishlist_id = $2
             WHERE wishlist_id = $1 AND NOT (variant_id = ANY($3))",
        )
        .bind(from.as_i32())
        .bind(to.as_i32())
        .bind(&skip)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_collection(&self, collection: WishlistId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM wishlists WHERE id = $1")
            .bind(collection.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
