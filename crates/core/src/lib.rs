//! Pantry Core - Shared cart domain types.
//!
//! This crate provides the domain model shared across the Pantry cart
//! components:
//! - `cart` - the cart reconciliation engine (guest store, remote gateway,
//!   state machine, merge coordinator)
//! - `integration-tests` - end-to-end scenarios against a stub backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no durable
//! storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product snapshots, cart items, the `CartSnapshot` aggregate,
//!   and the `Identity` that selects a cart's storage backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
