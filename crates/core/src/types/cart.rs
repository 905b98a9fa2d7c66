//! Cart items and the `CartSnapshot` aggregate.
//!
//! A snapshot's `total_items` and `total_price` are always derived from its
//! item list. Every mutation helper recomputes them, and deserialization
//! renormalizes them, so a snapshot can never be observed with aggregates
//! that disagree with its items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::ProductId;
use crate::types::product::ProductRef;

/// One line of a cart: a product snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product snapshot taken when the line was created.
    pub product: ProductRef,
    /// Number of units. Always >= 1; dropping to 0 removes the line.
    pub quantity: u32,
    /// Stable key for list rendering and lookups.
    ///
    /// Server-persisted lines carry the server's line identifier. Guest
    /// lines derive the key from the product ID plus a random suffix so two
    /// rapid adds of the same product cannot collide before a server
    /// identifier exists.
    pub line_key: String,
}

impl CartItem {
    /// Create a guest-side cart line with a locally generated line key.
    #[must_use]
    pub fn guest(product: ProductRef, quantity: u32) -> Self {
        let line_key = guest_line_key(&product.id);
        Self {
            product,
            quantity,
            line_key,
        }
    }

    /// Total price of this line (`quantity * product.price`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Derive a guest line key from a product ID plus a uniqueness suffix.
fn guest_line_key(product_id: &ProductId) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    format!("{product_id}-{suffix}")
}

/// The full state of one cart: an ordered item list plus derived totals.
///
/// Items are unique per product ID - adding an already-present product
/// increments its quantity instead of appending a duplicate line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SnapshotWire")]
pub struct CartSnapshot {
    /// Ordered cart lines, unique per product ID.
    pub items: Vec<CartItem>,
    /// Derived: sum of all quantities.
    pub total_items: u32,
    /// Derived: sum of `quantity * product.price` over all lines.
    pub total_price: Decimal,
}

/// Wire/storage shape of a snapshot.
///
/// Stored `totalItems`/`totalPrice` fields are accepted but never trusted:
/// only the item list is read, and [`CartSnapshot`] recomputes the
/// aggregates on conversion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotWire {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl From<SnapshotWire> for CartSnapshot {
    fn from(wire: SnapshotWire) -> Self {
        Self::from_items(wire.items)
    }
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CartSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
        }
    }

    /// Create a snapshot from a list of items, computing the aggregates.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut snapshot = Self {
            items,
            total_items: 0,
            total_price: Decimal::ZERO,
        };
        snapshot.recompute();
        snapshot
    }

    /// Recompute `total_items` and `total_price` from the item list.
    pub fn recompute(&mut self) {
        self.total_items = self.items.iter().map(|item| item.quantity).sum();
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of the given product in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.product.id == *product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Whether the given product is present in the cart.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.quantity_of(product_id) > 0
    }

    /// Add a product to the cart.
    ///
    /// If the product is already present its quantity is incremented by
    /// `quantity` (the existing line key is kept); otherwise a new guest
    /// line is appended. A zero quantity is a no-op.
    pub fn add(&mut self, product: ProductRef, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            item.quantity += quantity;
        } else {
            self.items.push(CartItem::guest(product, quantity));
        }
        self.recompute();
    }

    /// Replace the quantity of a product.
    ///
    /// A quantity of 0 removes the line. Setting a quantity for an absent
    /// product is a no-op.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == *product_id)
        {
            item.quantity = quantity;
            self.recompute();
        }
    }

    /// Remove a product's line from the cart.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|item| item.product.id != *product_id);
        self.recompute();
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64) -> ProductRef {
        ProductRef::new(id, format!("Product {id}"), Decimal::new(price_cents, 2))
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_items, 0);
        assert_eq!(snapshot.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_add_distinct_products_sums_quantities() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        snapshot.add(product("b", 500), 3);
        snapshot.add(product("c", 250), 1);

        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.total_items, 6);
        assert_eq!(snapshot.total_price, Decimal::new(3750, 2));
    }

    #[test]
    fn test_add_same_product_twice_merges_lines() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        let original_key = snapshot.items[0].line_key.clone();
        snapshot.add(product("a", 1000), 5);

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.quantity_of(&ProductId::new("a")), 7);
        // Merging keeps the existing line key
        assert_eq!(snapshot.items[0].line_key, original_key);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 0);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces_not_increments() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        snapshot.set_quantity(&ProductId::new("a"), 5);

        assert_eq!(snapshot.quantity_of(&ProductId::new("a")), 5);
        assert_eq!(snapshot.total_items, 5);
    }

    #[test]
    fn test_set_quantity_zero_removes_item() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        snapshot.set_quantity(&ProductId::new("a"), 0);

        assert!(!snapshot.contains(&ProductId::new("a")));
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_set_quantity_unknown_product_is_noop() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        snapshot.set_quantity(&ProductId::new("missing"), 4);

        assert_eq!(snapshot.total_items, 2);
        assert_eq!(snapshot.items.len(), 1);
    }

    #[test]
    fn test_totals_scenario() {
        // Product X: price 50, qty 2; product Y: price 30, qty 1
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("x", 5000), 2);
        snapshot.add(product("y", 3000), 1);

        assert_eq!(snapshot.total_price, Decimal::new(13000, 2));
        assert_eq!(snapshot.total_items, 3);
    }

    #[test]
    fn test_guest_line_keys_are_unique_per_add() {
        let a = CartItem::guest(product("a", 1000), 1);
        let b = CartItem::guest(product("a", 1000), 1);
        assert_ne!(a.line_key, b.line_key);
        assert!(a.line_key.starts_with("a-"));
    }

    #[test]
    fn test_serde_round_trip_preserves_state() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1099), 3);
        snapshot.add(product("b", 250), 2);

        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: CartSnapshot = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.items, snapshot.items);
        assert_eq!(back.total_items, snapshot.total_items);
        assert_eq!(back.total_price, snapshot.total_price);
    }

    #[test]
    fn test_deserialize_renormalizes_lying_aggregates() {
        // Stored aggregates disagree with the item list; the item list wins.
        let json = serde_json::json!({
            "items": [{
                "product": { "id": "a", "name": "Product a", "price": "10.00", "unit": "each" },
                "quantity": 2,
                "lineKey": "a-deadbeef"
            }],
            "totalItems": 99,
            "totalPrice": "999.00"
        });
        let snapshot: CartSnapshot = serde_json::from_value(json).expect("deserialize");

        assert_eq!(snapshot.total_items, 2);
        assert_eq!(snapshot.total_price, Decimal::new(2000, 2));
    }

    #[test]
    fn test_deserialize_missing_fields_defaults_empty() {
        let snapshot: CartSnapshot = serde_json::from_str("{}").expect("deserialize");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut snapshot = CartSnapshot::empty();
        snapshot.add(product("a", 1000), 2);
        snapshot.add(product("b", 500), 1);
        snapshot.clear();

        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.total_items, 0);
        assert_eq!(snapshot.total_price, Decimal::ZERO);
    }
}
