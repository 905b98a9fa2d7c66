//! Error types for the cart engine.
//!
//! Propagation policy: guest-store read errors are absorbed (a malformed
//! snapshot degrades to an empty cart), gateway errors surface as a
//! recoverable flag on the state machine, and nothing in this subsystem is
//! fatal to the application.

use thiserror::Error;

/// Errors from the remote cart gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request did not complete (DNS, connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cart API answered with a non-success status.
    #[error("cart API rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the API.
        status: u16,
        /// Message text extracted from the response body.
        message: String,
    },

    /// The bearer token could not be encoded as an HTTP header.
    #[error("invalid authorization header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Errors from the persistent guest store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Unified error surfaced by the cart state machine.
#[derive(Debug, Error)]
pub enum CartError {
    /// A remote cart call failed; the prior snapshot was retained.
    #[error("cart gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Persisting the guest snapshot failed.
    #[error("guest store error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// A short message suitable for showing to the buyer.
    ///
    /// Server rejections carry the API's own message text; transport and
    /// storage failures get a generic transient message so internal detail
    /// is not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Rejected { message, .. }) if !message.is_empty() => {
                message.clone()
            }
            Self::Gateway(_) => "Could not update your cart. Please try again.".to_string(),
            Self::Store(_) => "Could not save your cart on this device.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = GatewayError::Rejected {
            status: 422,
            message: "quantity out of bounds".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cart API rejected request (422): quantity out of bounds"
        );
    }

    #[test]
    fn test_user_message_surfaces_rejection_text() {
        let err = CartError::Gateway(GatewayError::Rejected {
            status: 422,
            message: "quantity out of bounds".to_string(),
        });
        assert_eq!(err.user_message(), "quantity out of bounds");
    }

    #[test]
    fn test_user_message_generic_for_empty_rejection() {
        let err = CartError::Gateway(GatewayError::Rejected {
            status: 502,
            message: String::new(),
        });
        assert_eq!(
            err.user_message(),
            "Could not update your cart. Please try again."
        );
    }

    #[test]
    fn test_user_message_hides_store_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CartError::Store(StoreError::Io(io));
        assert_eq!(err.user_message(), "Could not save your cart on this device.");
    }
}
