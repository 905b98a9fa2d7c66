//! Core types for the Pantry cart engine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod identity;
pub mod product;

pub use cart::{CartItem, CartSnapshot};
pub use id::ProductId;
pub use identity::Identity;
pub use product::ProductRef;
