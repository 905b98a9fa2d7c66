//! Storage backends behind the cart state machine.
//!
//! The machine never branches on identity inline; it holds a
//! `Box<dyn CartBackend>` and swaps the implementation when identity
//! changes. [`GuestBackend`] mutates the caller's snapshot and persists it
//! to the device; [`RemoteBackend`] ignores the caller's snapshot entirely
//! and adopts whatever the server returns (write-then-reconcile, no
//! optimistic local mutation).

use async_trait::async_trait;

use pantry_core::{CartSnapshot, ProductId, ProductRef};

use crate::error::CartError;
use crate::gateway::CartGateway;
use crate::store::GuestStore;

/// A cart storage backend.
///
/// Every operation takes the machine's current snapshot and returns the
/// snapshot the machine should adopt. On error the machine keeps its prior
/// snapshot; no operation partially applies.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Return the freshest snapshot this backend knows about.
    async fn fetch(&self, current: &CartSnapshot) -> Result<CartSnapshot, CartError>;

    /// Add a quantity of a product (additive merge by product ID).
    async fn add_item(
        &self,
        current: &CartSnapshot,
        product: ProductRef,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError>;

    /// Replace a product's quantity; 0 removes the line.
    async fn set_quantity(
        &self,
        current: &CartSnapshot,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError>;

    /// Remove a product's line.
    async fn remove_item(
        &self,
        current: &CartSnapshot,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, CartError>;

    /// Empty the cart.
    async fn clear(&self, current: &CartSnapshot) -> Result<CartSnapshot, CartError>;
}

// =============================================================================
// GuestBackend
// =============================================================================

/// Backend for anonymous carts: mutate in memory, persist to the device.
///
/// The in-memory snapshot is always current for guests, so `fetch` simply
/// echoes it back instead of re-reading the store.
#[derive(Debug, Clone)]
pub struct GuestBackend {
    store: GuestStore,
}

impl GuestBackend {
    /// Create a guest backend over the given store.
    #[must_use]
    pub const fn new(store: GuestStore) -> Self {
        Self { store }
    }

    /// Persist a mutated snapshot and hand it back for adoption.
    fn persist(&self, snapshot: CartSnapshot) -> Result<CartSnapshot, CartError> {
        self.store.save(&snapshot)?;
        Ok(snapshot)
    }
}

#[async_trait]
impl CartBackend for GuestBackend {
    async fn fetch(&self, current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
        Ok(current.clone())
    }

    async fn add_item(
        &self,
        current: &CartSnapshot,
        product: ProductRef,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let mut next = current.clone();
        next.add(product, quantity);
        self.persist(next)
    }

    async fn set_quantity(
        &self,
        current: &CartSnapshot,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let mut next = current.clone();
        next.set_quantity(product_id, quantity);
        self.persist(next)
    }

    async fn remove_item(
        &self,
        current: &CartSnapshot,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, CartError> {
        let mut next = current.clone();
        next.remove(product_id);
        self.persist(next)
    }

    async fn clear(&self, _current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
        self.persist(CartSnapshot::empty())
    }
}

// =============================================================================
// RemoteBackend
// =============================================================================

/// Backend for authenticated carts: every mutation is a server round trip
/// and the response snapshot is the new truth.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    gateway: CartGateway,
}

impl RemoteBackend {
    /// Create a remote backend over the given gateway.
    #[must_use]
    pub const fn new(gateway: CartGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CartBackend for RemoteBackend {
    async fn fetch(&self, _current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
        Ok(self.gateway.fetch_cart().await?)
    }

    async fn add_item(
        &self,
        _current: &CartSnapshot,
        product: ProductRef,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        Ok(self.gateway.add_item(&product.id, quantity).await?)
    }

    async fn set_quantity(
        &self,
        _current: &CartSnapshot,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        // The API treats a zero-quantity update as invalid; removal is its
        // own endpoint.
        if quantity == 0 {
            return Ok(self.gateway.remove_item(product_id).await?);
        }
        Ok(self.gateway.update_item(product_id, quantity).await?)
    }

    async fn remove_item(
        &self,
        _current: &CartSnapshot,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, CartError> {
        Ok(self.gateway.remove_item(product_id).await?)
    }

    async fn clear(&self, _current: &CartSnapshot) -> Result<CartSnapshot, CartError> {
        Ok(self.gateway.clear_cart().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal::Decimal;

    fn guest_backend() -> (tempfile::TempDir, GuestBackend) {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = GuestBackend::new(GuestStore::new(dir.path()));
        (dir, backend)
    }

    fn product(id: &str, price_cents: i64) -> ProductRef {
        ProductRef::new(id, format!("Product {id}"), Decimal::new(price_cents, 2))
    }

    #[tokio::test]
    async fn test_guest_add_persists_to_store() {
        let (dir, backend) = guest_backend();
        let current = CartSnapshot::empty();

        let next = backend
            .add_item(&current, product("a", 1200), 2)
            .await
            .expect("add");
        assert_eq!(next.total_items, 2);

        // A fresh store over the same directory sees the persisted snapshot
        let reloaded = GuestStore::new(dir.path()).load();
        assert_eq!(reloaded.total_items, 2);
        assert!(reloaded.contains(&ProductId::new("a")));
    }

    #[tokio::test]
    async fn test_guest_fetch_echoes_current_snapshot() {
        let (_dir, backend) = guest_backend();
        let mut current = CartSnapshot::empty();
        current.add(product("a", 1200), 4);

        let fetched = backend.fetch(&current).await.expect("fetch");
        assert_eq!(fetched, current);
    }

    #[tokio::test]
    async fn test_guest_clear_persists_empty_snapshot() {
        let (dir, backend) = guest_backend();
        let mut current = CartSnapshot::empty();
        current.add(product("a", 1200), 4);
        backend.store.save(&current).expect("seed");

        let next = backend.clear(&current).await.expect("clear");
        assert!(next.is_empty());
        assert!(GuestStore::new(dir.path()).load().is_empty());
    }

    #[tokio::test]
    async fn test_guest_set_quantity_zero_removes() {
        let (_dir, backend) = guest_backend();
        let mut current = CartSnapshot::empty();
        current.add(product("a", 1200), 4);

        let next = backend
            .set_quantity(&current, &ProductId::new("a"), 0)
            .await
            .expect("set");
        assert!(!next.contains(&ProductId::new("a")));
    }
}
