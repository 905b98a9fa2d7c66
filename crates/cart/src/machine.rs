//! The cart state machine.
//!
//! Single owner of the current snapshot and its busy/error status. All
//! mutating operations run to completion (including their network round
//! trip) before the next is dispatched, so there is no locking here; the
//! caller's event loop serializes mutations per machine.

use secrecy::SecretString;
use tracing::{instrument, warn};

use pantry_core::{CartSnapshot, Identity, ProductId, ProductRef};

use crate::backend::{CartBackend, GuestBackend, RemoteBackend};
use crate::config::CartConfig;
use crate::error::CartError;
use crate::gateway::CartGateway;
use crate::merge::{MergeOutcome, merge_guest_cart};
use crate::store::GuestStore;

/// Owner of the current cart snapshot, dispatching mutations to the
/// backend selected by the current identity.
///
/// Failure semantics: a failed operation leaves the snapshot untouched and
/// parks a recoverable error in [`error`](Self::error). Nothing is retried
/// automatically; the consumer may simply re-invoke the operation.
pub struct CartMachine {
    config: CartConfig,
    store: GuestStore,
    identity: Identity,
    backend: Box<dyn CartBackend>,
    snapshot: CartSnapshot,
    busy: bool,
    error: Option<CartError>,
}

impl CartMachine {
    /// Create a machine starting as a guest, seeded from the persisted
    /// guest snapshot (empty if none).
    #[must_use]
    pub fn new(config: CartConfig) -> Self {
        let store = GuestStore::new(&config.state_dir);
        let snapshot = store.load();
        let backend = Box::new(GuestBackend::new(store.clone()));
        Self {
            config,
            store,
            identity: Identity::Guest,
            backend,
            snapshot,
            busy: false,
            error: None,
        }
    }

    // =========================================================================
    // Observable state
    // =========================================================================

    /// The current snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// The current cart lines.
    #[must_use]
    pub fn items(&self) -> &[pantry_core::CartItem] {
        &self.snapshot.items
    }

    /// Derived: sum of all quantities.
    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.snapshot.total_items
    }

    /// Derived: sum of `quantity * price` over all lines.
    #[must_use]
    pub const fn total_price(&self) -> rust_decimal::Decimal {
        self.snapshot.total_price
    }

    /// Quantity of the given product in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.snapshot.quantity_of(product_id)
    }

    /// Whether the given product is present in the cart.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.snapshot.contains(product_id)
    }

    /// Whether an operation is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// The error left by the last failed operation, if any.
    ///
    /// Cleared at the start of every operation.
    #[must_use]
    pub const fn error(&self) -> Option<&CartError> {
        self.error.as_ref()
    }

    /// The identity the cart is currently scoped to.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add a quantity of a product to the cart.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&mut self, product: ProductRef, quantity: u32) {
        self.begin();
        let result = self.backend.add_item(&self.snapshot, product, quantity).await;
        self.finish(result);
    }

    /// Remove a product's line from the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&mut self, product_id: &ProductId) {
        self.begin();
        let result = self.backend.remove_item(&self.snapshot, product_id).await;
        self.finish(result);
    }

    /// Replace a product's quantity; 0 removes the line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        self.begin();
        let result = self
            .backend
            .set_quantity(&self.snapshot, product_id, quantity)
            .await;
        self.finish(result);
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        self.begin();
        let result = self.backend.clear(&self.snapshot).await;
        self.finish(result);
    }

    /// Re-fetch the backend's snapshot and adopt it.
    ///
    /// For guests this is a no-op: the in-memory snapshot is always already
    /// current.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) {
        self.begin();
        let result = self.backend.fetch(&self.snapshot).await;
        self.finish(result);
    }

    // =========================================================================
    // Identity transitions
    // =========================================================================

    /// Transition from guest to authenticated.
    ///
    /// Runs the merge coordinator exactly once (draining the guest store
    /// into the server cart), swaps the backend, then refreshes so the
    /// in-memory cart reflects the authoritative post-merge server state.
    ///
    /// # Errors
    ///
    /// Returns `CartError` only if the gateway cannot be constructed from
    /// the token. Per-item merge failures do not error; they are reported
    /// in the returned [`MergeOutcome`].
    #[instrument(skip(self, token))]
    pub async fn login(&mut self, token: SecretString) -> Result<MergeOutcome, CartError> {
        let gateway = CartGateway::new(&self.config, &token)?;
        let remote = RemoteBackend::new(gateway);

        let outcome = merge_guest_cart(&self.store, &remote).await;

        self.identity = Identity::Authenticated { token };
        self.backend = Box::new(remote);
        self.refresh().await;

        Ok(outcome)
    }

    /// Transition back to guest.
    ///
    /// Resets to the persisted guest snapshot (usually empty after a
    /// merge). The server cart is left as-is: there is no merge on the way
    /// out.
    pub fn logout(&mut self) {
        self.identity = Identity::Guest;
        self.backend = Box::new(GuestBackend::new(self.store.clone()));
        self.snapshot = self.store.load();
        self.error = None;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin(&mut self) {
        self.busy = true;
        self.error = None;
    }

    fn finish(&mut self, result: Result<CartSnapshot, CartError>) {
        self.busy = false;
        match result {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(e) => {
                warn!(error = %e, "cart operation failed, snapshot unchanged");
                self.error = Some(e);
            }
        }
    }
}
