//! Guest cart and wishlist consolidation.
//!
//! When a shopper signs in after browsing anonymously, their guest cart and
//! wishlist are folded into the account's persistent collections. Cart and
//! wishlist merges used to be separate code paths in an earlier cut of this
//! service; they now share one generic routine over [`CollectionStore`] so
//! the de-duplication semantics cannot silently diverge between the two.
//!
//! # Failure semantics
//!
//! The merge is a short sequence of dependent reads and writes, not a single
//! transaction. The ordering protects guest data:
//!
//! - a failed lookup aborts before anything is written
//! - a failed re-parent (the only insert-equivalent write) leaves the guest
//!   collection intact so a later retry can merge it
//! - a failed guest-collection delete *after* a successful re-parent is
//!   logged and swallowed: the items are already in the user's collection,
//!   and a retry merge de-duplicates, so the stale guest row is harmless
//!
//! Running the merge twice is a no-op the second time: the guest collection
//! is gone (or only holds variants the user already has), so nothing moves.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use meridian_core::{UserId, VariantId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::wishlists::WishlistRepository;

/// Errors that can fail a merge.
///
/// Distinguishing lookup from write failures matters operationally: a write
/// failure guarantees the guest collection was preserved for retry, a lookup
/// failure guarantees nothing was mutated at all.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A read or resolve step failed; no mutations were made.
    #[error("merge lookup failed: {0}")]
    Lookup(#[source] RepositoryError),

    /// Moving guest items into the user collection failed; guest data was
    /// preserved for retry.
    #[error("merge write failed: {0}")]
    Write(#[source] RepositoryError),
}

/// Counts reported by one collection merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Guest items moved into the user collection.
    pub items_added: u64,
    /// Guest items skipped because the variant was already present
    /// (the existing user item wins).
    pub items_updated: u64,
}

/// Combined counts across the cart and wishlist merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Total guest items moved across both collections.
    pub items_added: u64,
    /// Total guest items skipped as already present.
    pub items_updated: u64,
}

impl MergeSummary {
    fn absorb(&mut self, outcome: MergeOutcome) {
        self.items_added += outcome.items_added;
        self.items_updated += outcome.items_updated;
    }
}

/// Storage contract for a mergeable collection (cart or wishlist).
///
/// The trait captures exactly the operations the merge sequence needs, in
/// storage-neutral terms, which keeps the merge itself testable against an
/// in-memory store.
pub trait CollectionStore {
    /// Collection kind for log fields.
    const KIND: &'static str;

    /// Opaque collection identifier.
    type Id: Copy + Send + Sync + std::fmt::Display;

    /// Resolve the user's default collection, creating it if absent.
    fn ensure_user_default(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Self::Id, RepositoryError>> + Send;

    /// Locate the guest collection for a session, without creating one.
    fn find_guest_collection(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Option<Self::Id>, RepositoryError>> + Send;

    /// The set of variants currently present in a collection.
    fn variant_ids(
        &self,
        collection: Self::Id,
    ) -> impl Future<Output = Result<HashSet<VariantId>, RepositoryError>> + Send;

    /// Move every item except the skipped variants from one collection to
    /// another, returning how many rows moved.
    fn reparent_items_except(
        &self,
        from: Self::Id,
        to: Self::Id,
        skip: &[VariantId],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete a collection and (by cascade) its remaining items.
    fn delete_collection(
        &self,
        collection: Self::Id,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Merge one guest collection into the user's default collection.
///
/// Steps, in order: ensure the destination exists, locate the guest source
/// (absent source short-circuits to a zero outcome), diff the variant sets,
/// move the surviving guest items, then delete the guest collection. See the
/// module docs for what each failure point guarantees.
///
/// # Errors
///
/// Returns [`MergeError::Lookup`] if a read/resolve step fails (nothing
/// mutated) and [`MergeError::Write`] if the item move fails (guest data
/// preserved).
#[instrument(skip(store), fields(kind = S::KIND))]
pub async fn merge_collection<S: CollectionStore>(
    store: &S,
    user_id: UserId,
    guest_session: Uuid,
) -> Result<MergeOutcome, MergeError> {
    let destination = store
        .ensure_user_default(user_id)
        .await
        .map_err(MergeError::Lookup)?;

    let Some(source) = store
        .find_guest_collection(guest_session)
        .await
        .map_err(MergeError::Lookup)?
    else {
        // Nothing to merge; the common case on every sign-in after the first.
        return Ok(MergeOutcome::default());
    };

    let guest_variants = store.variant_ids(source).await.map_err(MergeError::Lookup)?;
    let user_variants = store
        .variant_ids(destination)
        .await
        .map_err(MergeError::Lookup)?;

    // Existing user items win: variants present on both sides stay as the
    // user saved them, and the guest copy goes down with the guest row.
    let skip: Vec<VariantId> = guest_variants
        .intersection(&user_variants)
        .copied()
        .collect();
    let items_updated = skip.len() as u64;

    let items_added = store
        .reparent_items_except(source, destination, &skip)
        .await
        .map_err(MergeError::Write)?;

    // Past this point the merge has succeeded. A failed delete leaves a
    // stale guest row whose remaining items are all duplicates; a retry
    // merge skips them, so log it and report success anyway.
    if let Err(e) = store.delete_collection(source).await {
        tracing::warn!(
            kind = S::KIND,
            collection = %source,
            error = %e,
            "failed to delete guest collection after merge"
        );
    }

    Ok(MergeOutcome {
        items_added,
        items_updated,
    })
}

/// Service that merges a guest session's cart and wishlist into a user's
/// persistent collections at sign-in.
pub struct ConsolidationService<'a> {
    pool: &'a PgPool,
}

impl<'a> ConsolidationService<'a> {
    /// Create a new consolidation service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Merge the guest session's cart and wishlist into the user's.
    ///
    /// With no guest session present this is a zero-cost no-op: nothing is
    /// read or written. The cart and wishlist merges are independent; each
    /// runs its own sequence and their counts are summed.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] if either collection merge fails. See
    /// [`merge_collection`] for what state each failure leaves behind.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn merge_guest_data(
        &self,
        user_id: UserId,
        guest_session: Option<Uuid>,
    ) -> Result<MergeSummary, MergeError> {
        let Some(guest_session) = guest_session else {
            return Ok(MergeSummary::default());
        };

        let mut summary = MergeSummary::default();

        let carts = CartRepository::new(self.pool);
        summary.absorb(merge_collection(&carts, user_id, guest_session).await?);

        let wishlists = WishlistRepository::new(self.pool);
        summary.absorb(merge_collection(&wishlists, user_id, guest_session).await?);

        tracing::info!(
            items_added = summary.items_added,
            items_updated = summary.items_updated,
            "guest data merged"
        );

        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// One saved item in the in-memory store.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MemItem {
        collection: i32,
        variant: VariantId,
        quantity: i32,
    }

    #[derive(Debug, Default)]
    struct MemInner {
        next_id: i32,
        user_collection: Option<i32>,
        guest_collection: Option<(Uuid, i32)>,
        items: Vec<MemItem>,
    }

    /// In-memory [`CollectionStore`] with injectable failures.
    #[derive(Default)]
    struct MemStore {
        inner: Mutex<MemInner>,
        fail_reparent: bool,
        fail_delete: bool,
    }

    impl MemStore {
        fn with_guest_items(items: &[(i32, i32)]) -> (Self, Uuid) {
            let store = Self::default();
            let session = Uuid::new_v4();
            {
                let mut inner = store.inner.lock().unwrap();
                inner.next_id = 1;
                inner.guest_collection = Some((session, 1));
                for &(variant, quantity) in items {
                    inner.items.push(MemItem {
                        collection: 1,
                        variant: VariantId::new(variant),
                        quantity,
                    });
                }
            }
            (store, session)
        }

        fn seed_user_item(&self, variant: i32, quantity: i32) {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.user_collection.unwrap_or_else(|| {
                inner.next_id += 1;
                let id = inner.next_id;
                inner.user_collection = Some(id);
                id
            });
            inner.items.push(MemItem {
                collection: id,
                variant: VariantId::new(variant),
                quantity,
            });
        }

        fn user_items(&self) -> Vec<MemItem> {
            let inner = self.inner.lock().unwrap();
            let Some(id) = inner.user_collection else {
                return Vec::new();
            };
            inner
                .items
                .iter()
                .copied()
                .filter(|i| i.collection == id)
                .collect()
        }

        fn guest_exists(&self) -> bool {
            self.inner.lock().unwrap().guest_collection.is_some()
        }
    }

    fn repo_err() -> RepositoryError {
        RepositoryError::Database(sqlx::Error::PoolClosed)
    }

    impl CollectionStore for MemStore {
        const KIND: &'static str = "wishlist";

        type Id = i32;

        async fn ensure_user_default(&self, _user_id: UserId) -> Result<i32, RepositoryError> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(id) = inner.user_collection {
                return Ok(id);
            }
            inner.next_id += 1;
            let id = inner.next_id;
            inner.user_collection = Some(id);
            Ok(id)
        }

        async fn find_guest_collection(
            &self,
            session_id: Uuid,
        ) -> Result<Option<i32>, RepositoryError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .guest_collection
                .filter(|(session, _)| *session == session_id)
                .map(|(_, id)| id))
        }

        async fn variant_ids(&self, collection: i32) -> Result<HashSet<VariantId>, RepositoryError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .items
                .iter()
                .filter(|i| i.collection == collection)
                .map(|i| i.variant)
                .collect())
        }

        async fn reparent_items_except(
            &self,
            from: i32,
            to: i32,
            skip: &[VariantId],
        ) -> Result<u64, RepositoryError> {
            if self.fail_reparent {
                return Err(repo_err());
            }
            let mut inner = self.inner.lock().unwrap();
            let mut moved = 0;
            for item in &mut inner.items {
                if item.collection == from && !skip.contains(&item.variant) {
                    item.collection = to;
                    moved += 1;
                }
            }
            Ok(moved)
        }

        async fn delete_collection(&self, collection: i32) -> Result<(), RepositoryError> {
            if self.fail_delete {
                return Err(repo_err());
            }
            let mut inner = self.inner.lock().unwrap();
            inner.items.retain(|i| i.collection != collection);
            if inner.guest_collection.is_some_and(|(_, id)| id == collection) {
                inner.guest_collection = None;
            }
            Ok(())
        }
    }

    fn user() -> UserId {
        UserId::new(10)
    }

    #[tokio::test]
    async fn test_merge_moves_all_items_into_empty_user_collection() {
        let (store, session) = MemStore::with_guest_items(&[(1, 2), (2, 1), (3, 4)]);

        let outcome = merge_collection(&store, user(), session).await.unwrap();

        assert_eq!(outcome.items_added, 3);
        assert_eq!(outcome.items_updated, 0);
        assert_eq!(store.user_items().len(), 3);
        assert!(!store.guest_exists());
    }

    #[tokio::test]
    async fn test_merge_twice_is_idempotent() {
        let (store, session) = MemStore::with_guest_items(&[(1, 1), (2, 1)]);

        let first = merge_collection(&store, user(), session).await.unwrap();
        assert_eq!(first.items_added, 2);

        // Second run finds no guest collection and short-circuits.
        let second = merge_collection(&store, user(), session).await.unwrap();
        assert_eq!(second, MergeOutcome::default());
        assert_eq!(store.user_items().len(), 2);
    }

    #[tokio::test]
    async fn test_existing_user_item_wins() {
        let (store, session) = MemStore::with_guest_items(&[(1, 5), (2, 1)]);
        store.seed_user_item(1, 2);

        let outcome = merge_collection(&store, user(), session).await.unwrap();

        assert_eq!(outcome.items_added, 1);
        assert_eq!(outcome.items_updated, 1);

        let items = store.user_items();
        assert_eq!(items.len(), 2);
        // The user's saved quantity survives; the guest quantity is discarded.
        let kept = items
            .iter()
            .find(|i| i.variant == VariantId::new(1))
            .unwrap();
        assert_eq!(kept.quantity, 2);
        assert!(items.iter().any(|i| i.variant == VariantId::new(2)));
    }

    #[tokio::test]
    async fn test_no_guest_collection_short_circuits() {
        let store = MemStore::default();

        let outcome = merge_collection(&store, user(), Uuid::new_v4()).await.unwrap();

        assert_eq!(outcome, MergeOutcome::default());
        // Only the user's default collection was ensured; no items appeared.
        assert!(store.user_items().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_preserves_guest_data() {
        let (mut store, session) = {
            let (store, session) = MemStore::with_guest_items(&[(1, 1), (2, 1)]);
            (store, session)
        };
        store.fail_reparent = true;

        let result = merge_collection(&store, user(), session).await;

        assert!(matches!(result, Err(MergeError::Write(_))));
        assert!(store.guest_exists());
        assert_eq!(store.user_items().len(), 0);
    }

    #[tokio::test]
    async fn test_failed_cleanup_still_reports_success() {
        let (mut store, session) = MemStore::with_guest_items(&[(1, 5), (2, 1)]);
        store.seed_user_item(1, 2);
        store.fail_delete = true;

        let outcome = merge_collection(&store, user(), session).await.unwrap();
        assert_eq!(outcome.items_added, 1);
        assert_eq!(outcome.items_updated, 1);

        // Re-parenting moved variant 2 out, so the stale guest row holds
        // only the skipped duplicate. A retry moves nothing and reports the
        // duplicate as already present.
        assert!(store.guest_exists());
        let retry = merge_collection(&store, user(), session).await.unwrap();
        assert_eq!(retry.items_added, 0);
        assert_eq!(retry.items_updated, 1);
        assert_eq!(store.user_items().len(), 2);
    }

    #[tokio::test]
    async fn test_service_without_guest_session_is_noop() {
        // connect_lazy never opens a connection; the no-session path must
        // return before any query runs.
        let pool = PgPool::connect_lazy("postgres://localhost/meridian_test").unwrap();
        let service = ConsolidationService::new(&pool);

        let summary = service.merge_guest_data(user(), None).await.unwrap();
        assert_eq!(summary, MergeSummary::default());
    }
}
