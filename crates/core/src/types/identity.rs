//! Who the cart belongs to, and therefore where it is stored.

use secrecy::SecretString;

/// The identity a cart is scoped to.
///
/// The cart's storage backend is a pure function of this value: guests use
/// the device-local persistent store, authenticated users use the remote
/// cart API.
#[derive(Clone)]
pub enum Identity {
    /// No credential; the cart lives on the device.
    Guest,
    /// Logged-in user; the cart lives server-side.
    Authenticated {
        /// Bearer credential attached to every remote cart call.
        token: SecretString,
    },
}

impl Identity {
    /// Whether this identity carries a credential.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The bearer token, if authenticated.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        match self {
            Self::Guest => None,
            Self::Authenticated { token } => Some(token),
        }
    }
}

// Manual Debug to keep the bearer token out of logs.
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guest => write!(f, "Guest"),
            Self::Authenticated { .. } => f
                .debug_struct("Authenticated")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_authenticated() {
        assert!(!Identity::Guest.is_authenticated());
        let identity = Identity::Authenticated {
            token: SecretString::from("token-123"),
        };
        assert!(identity.is_authenticated());
        assert!(identity.token().is_some());
        assert!(Identity::Guest.token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let identity = Identity::Authenticated {
            token: SecretString::from("super-secret"),
        };
        let debug = format!("{identity:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
