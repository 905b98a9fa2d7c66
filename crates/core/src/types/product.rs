//! Denormalized product snapshots carried inside cart items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A snapshot of a catalog product taken at the moment it was added to a
/// cart.
///
/// The cart owns this copy; it is deliberately NOT re-synchronized with the
/// live catalog after insertion, so a price change in the catalog does not
/// retroactively change what the buyer saw when they added the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Catalog product identifier.
    pub id: ProductId,
    /// Display name at time of adding.
    pub name: String,
    /// Unit price at time of adding.
    pub price: Decimal,
    /// Unit of measure (e.g., "kg", "case", "each").
    pub unit: String,
    /// Primary image reference, if the product has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Original list price when `price` is discounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
}

impl ProductRef {
    /// Create a product snapshot with no image or discount data.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            unit: "each".to_string(),
            image_url: None,
            list_price: None,
        }
    }

    /// Whether the snapshot carries a discount relative to its list price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.list_price.is_some_and(|list| list > self.price)
    }
}
