//! Persistent guest cart storage.
//!
//! One snapshot, one fixed namespace key, scoped to the device profile
//! rather than any account. Writes are last-write-wins with no versioning;
//! a malformed stored snapshot is treated as absent, never as a fatal
//! error, so the worst case on startup is an empty cart.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::warn;

use pantry_core::CartSnapshot;

use crate::error::StoreError;

/// Fixed namespace key under which the guest snapshot is stored.
pub const GUEST_CART_KEY: &str = "pantry.guest-cart.v1";

/// Durable storage for the anonymous cart snapshot.
#[derive(Debug, Clone)]
pub struct GuestStore {
    path: PathBuf,
}

impl GuestStore {
    /// Create a store rooted at the given state directory.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join(format!("{GUEST_CART_KEY}.json")),
        }
    }

    /// Load the stored snapshot.
    ///
    /// Returns an empty snapshot if nothing is stored or the stored value
    /// is unreadable/malformed. Corruption is logged and absorbed here;
    /// it is never surfaced to the caller.
    #[must_use]
    pub fn load(&self) -> CartSnapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return CartSnapshot::empty(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read guest cart, starting empty");
                return CartSnapshot::empty();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed guest cart, starting empty");
                CartSnapshot::empty()
            }
        }
    }

    /// Serialize and overwrite the stored snapshot unconditionally.
    ///
    /// The write goes to a temp file first and is renamed into place, so a
    /// crash mid-write cannot leave a half-written snapshot behind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or the filesystem write fails.
    pub fn save(&self, snapshot: &CartSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Remove the stored snapshot entirely.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on filesystem failure; a missing file is not an
    /// error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
