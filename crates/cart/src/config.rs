//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the backend cart API
//!   (e.g., `https://api.pantrygrocer.example`)
//!
//! ## Optional
//! - `CART_STATE_DIR` - Directory holding the persisted guest cart
//!   (default: `.pantry`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the backend cart API, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the persisted guest cart snapshot.
    pub state_dir: PathBuf,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or the base
    /// URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("CART_API_BASE_URL")?;
        let state_dir = PathBuf::from(get_env_or_default("CART_STATE_DIR", ".pantry"));

        Self::new(api_base_url, state_dir)
    }

    /// Build a configuration from explicit values, validating the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the base URL does not parse
    /// or is not http(s).
    pub fn new(
        api_base_url: impl Into<String>,
        state_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let raw = api_base_url.into();
        let url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CART_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        Ok(Self {
            api_base_url: raw.trim_end_matches('/').to_string(),
            state_dir: state_dir.into(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = CartConfig::new("https://api.example.com/", ".pantry").expect("valid");
        assert_eq!(config.api_base_url, "https://api.example.com");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = CartConfig::new("not a url", ".pantry").expect_err("should fail");
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let err = CartConfig::new("ftp://api.example.com", ".pantry").expect_err("should fail");
        assert!(err.to_string().contains("unsupported scheme"));
    }
}
