//! The merge coordinator.
//!
//! Runs once per guest-to-authenticated transition: drain the persisted
//! guest cart into the server cart, then discard the guest snapshot.
//!
//! The guest store is cleared BEFORE any network call completes. This is
//! the idempotency guard: a re-triggered or interrupted merge sees an
//! empty guest cart and applies nothing twice. The cost is that a total
//! failure of the add calls loses the guest cart. Clearing only after all
//! adds succeed would be more durable but would open a window where a
//! crash causes a duplicate merge on retry; the current ordering is the
//! intended tradeoff, so do not reorder it casually.
//!
//! The merge itself is at-least-once and best-effort, not transactional:
//! items are applied in guest-cart order, one add call each, and a failed
//! item does not block the rest. Because the server's add semantics are
//! additive per product, the merged quantity for a product equals the
//! guest quantity plus whatever the server cart already held.

use tracing::{instrument, warn};

use pantry_core::{CartSnapshot, ProductId};

use crate::backend::CartBackend;
use crate::error::CartError;
use crate::store::GuestStore;

/// Per-item results of a merge.
///
/// Callers decide whether to surface partial failures; the coordinator
/// only logs them.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Products whose add call succeeded, in merge order.
    pub merged: Vec<ProductId>,
    /// Products whose add call failed, with the reason. These lines are
    /// lost: the guest store was already cleared and nothing retries them.
    pub failed: Vec<(ProductId, CartError)>,
}

impl MergeOutcome {
    /// Number of items the coordinator attempted to merge.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.merged.len() + self.failed.len()
    }

    /// Whether every attempted item merged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drain the guest store into the remote cart, best-effort.
///
/// An empty guest cart returns immediately with an empty outcome, which is
/// what makes a second invocation a no-op.
#[instrument(skip(store, remote))]
pub async fn merge_guest_cart(store: &GuestStore, remote: &dyn CartBackend) -> MergeOutcome {
    let guest = store.load();
    if guest.is_empty() {
        return MergeOutcome::default();
    }

    // Idempotency guard: clear before the network calls. See module docs
    // for the durability tradeoff.
    if let Err(e) = store.clear() {
        warn!(error = %e, "failed to clear guest store before merge");
    }

    let mut outcome = MergeOutcome::default();
    // Remote backends ignore the passed-in snapshot; an empty one keeps the
    // call honest about not depending on local state.
    let scratch = CartSnapshot::empty();

    for item in guest.items {
        let product_id = item.product.id.clone();
        match remote.add_item(&scratch, item.product, item.quantity).await {
            Ok(_) => outcome.merged.push(product_id),
            Err(e) => {
                warn!(
                    product_id = %product_id,
                    quantity = item.quantity,
                    error = %e,
                    "guest cart line failed to merge and was dropped"
                );
                outcome.failed.push((product_id, e));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use pantry_core::ProductRef;

    use crate::error::GatewayError;

    /// Records add calls; fails for product IDs in `reject`.
    #[derive(Default)]
    struct RecordingRemote {
        adds: Mutex<Vec<(ProductId, u32)>>,
        reject: Vec<ProductId>,
    }

    #[async_trait]
    impl CartBackend for RecordingRemote {
        async fn fetch(&self, _current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
            Ok(CartSnapshot::empty())
        }

        async fn add_item(
            &self,
            _current: &CartSnapshot,
            product: ProductRef,
            quantity: u32,
        ) -> Result<CartSnapshot, CartError> {
            if self.reject.contains(&product.id) {
                return Err(CartError::Gateway(GatewayError::Rejected {
                    status: 422,
                    message: "unknown product".to_string(),
                }));
            }
            self.adds
                .lock()
                .expect("lock")
                .push((product.id, quantity));
            Ok(CartSnapshot::empty())
        }

        async fn set_quantity(
            &self,
            _current: &CartSnapshot,
            _product_id: &ProductId,
            _quantity: u32,
        ) -> Result<CartSnapshot, CartError> {
            Ok(CartSnapshot::empty())
        }

        async fn remove_item(
            &self,
            _current: &CartSnapshot,
            _product_id: &ProductId,
        ) -> Result<CartSnapshot, CartError> {
            Ok(CartSnapshot::empty())
        }

        async fn clear(&self, _current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
            Ok(CartSnapshot::empty())
        }
    }

    fn seeded_store() -> (tempfile::TempDir, GuestStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GuestStore::new(dir.path());

        let mut snapshot = CartSnapshot::empty();
        snapshot.add(ProductRef::new("a", "Product a", Decimal::new(1000, 2)), 2);
        snapshot.add(ProductRef::new("b", "Product b", Decimal::new(500, 2)), 1);
        snapshot.add(ProductRef::new("c", "Product c", Decimal::new(250, 2)), 4);
        store.save(&snapshot).expect("seed");

        (dir, store)
    }

    #[tokio::test]
    async fn test_merge_applies_items_in_order() {
        let (_dir, store) = seeded_store();
        let remote = RecordingRemote::default();

        let outcome = merge_guest_cart(&store, &remote).await;

        assert!(outcome.is_clean());
        assert_eq!(outcome.attempted(), 3);
        let adds = remote.adds.lock().expect("lock");
        assert_eq!(
            *adds,
            vec![
                (ProductId::new("a"), 2),
                (ProductId::new("b"), 1),
                (ProductId::new("c"), 4),
            ]
        );
    }

    #[tokio::test]
    async fn test_merge_clears_guest_store() {
        let (_dir, store) = seeded_store();
        let remote = RecordingRemote::default();

        merge_guest_cart(&store, &remote).await;
        assert!(store.load().is_empty());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (_dir, store) = seeded_store();
        let remote = RecordingRemote::default();

        merge_guest_cart(&store, &remote).await;
        let second = merge_guest_cart(&store, &remote).await;

        assert_eq!(second.attempted(), 0);
        // Still exactly one add per original guest line
        assert_eq!(remote.adds.lock().expect("lock").len(), 3);
    }

    #[tokio::test]
    async fn test_empty_guest_cart_merges_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GuestStore::new(dir.path());
        let remote = RecordingRemote::default();

        let outcome = merge_guest_cart(&store, &remote).await;
        assert_eq!(outcome.attempted(), 0);
        assert!(remote.adds.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_failed_item_does_not_block_the_rest() {
        let (_dir, store) = seeded_store();
        let remote = RecordingRemote {
            reject: vec![ProductId::new("b")],
            ..Default::default()
        };

        let outcome = merge_guest_cart(&store, &remote).await;

        assert_eq!(outcome.merged, vec![ProductId::new("a"), ProductId::new("c")]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, ProductId::new("b"));
        assert!(!outcome.is_clean());

        // The guest store stays cleared even though one line was lost
        assert!(store.load().is_empty());
    }
}
