//! Pantry cart reconciliation engine.
//!
//! # Architecture
//!
//! - [`machine::CartMachine`] is the single owner of the current
//!   [`CartSnapshot`](pantry_core::CartSnapshot) and its busy/error status
//! - Mutations dispatch through a [`backend::CartBackend`], selected from
//!   the current [`Identity`](pantry_core::Identity): guests write to the
//!   device-local [`store::GuestStore`], authenticated users go through the
//!   [`gateway::CartGateway`] and adopt the server's response snapshot
//! - [`merge::merge_guest_cart`] runs once per login transition and drains
//!   the guest store into the server cart, additively and best-effort
//!
//! Authenticated mutations are write-then-reconcile: the server is the
//! source of truth, and no local prediction is applied before the response
//! arrives. A failed remote call leaves the snapshot untouched and parks a
//! recoverable error on the machine.
//!
//! # Example
//!
//! ```rust,ignore
//! use pantry_cart::{CartConfig, CartMachine};
//! use secrecy::SecretString;
//!
//! let config = CartConfig::from_env()?;
//! let mut cart = CartMachine::new(config);
//!
//! // Guest browsing
//! cart.add_item(product, 2).await;
//!
//! // Login: guest lines are merged into the server cart, once
//! let outcome = cart.login(SecretString::from(token)).await?;
//! if !outcome.failed.is_empty() {
//!     tracing::warn!("some guest lines were not merged");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod machine;
pub mod merge;
pub mod store;

pub use backend::{CartBackend, GuestBackend, RemoteBackend};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, GatewayError, StoreError};
pub use gateway::CartGateway;
pub use machine::CartMachine;
pub use merge::{MergeOutcome, merge_guest_cart};
pub use store::GuestStore;
