//! Remote cart gateway.
//!
//! A stateless request/response mapping to the backend cart endpoints. The
//! bearer credential is installed as a default header at construction and
//! attached to every call. Each method is a full round trip returning the
//! fresh server snapshot; there is no caching and no retry - the caller
//! adopts the returned snapshot as the new source of truth.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pantry_core::{CartSnapshot, ProductId};

use crate::config::CartConfig;
use crate::error::GatewayError;

/// Request body for `POST /api/cart/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

/// Request body for `PUT /api/cart/items/:productId`.
#[derive(Debug, Serialize)]
struct UpdateItemRequest {
    quantity: u32,
}

/// Error body shape returned by the cart API on rejection.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the backend cart endpoints.
#[derive(Debug, Clone)]
pub struct CartGateway {
    client: reqwest::Client,
    base_url: String,
}

impl CartGateway {
    /// Create a gateway that authenticates every call with the given
    /// bearer token.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidHeader` if the token cannot be encoded
    /// as an HTTP header value.
    pub fn new(config: &CartConfig, token: &SecretString) -> Result<Self, GatewayError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Fetch the current server cart.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<CartSnapshot, GatewayError> {
        let url = format!("{}/api/cart", self.base_url);
        self.request_snapshot(self.client.get(&url)).await
    }

    /// Add a quantity of a product to the server cart.
    ///
    /// The server merges by product ID with additive quantity semantics:
    /// adding a product already in the cart increments its quantity.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the API rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, GatewayError> {
        let url = format!("{}/api/cart/items", self.base_url);
        let body = AddItemRequest {
            product_id,
            quantity,
        };
        self.request_snapshot(self.client.post(&url).json(&body))
            .await
    }

    /// Replace the quantity of a product in the server cart.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the API rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, GatewayError> {
        let url = format!("{}/api/cart/items/{product_id}", self.base_url);
        let body = UpdateItemRequest { quantity };
        self.request_snapshot(self.client.put(&url).json(&body))
            .await
    }

    /// Remove a product's line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the API rejects it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<CartSnapshot, GatewayError> {
        let url = format!("{}/api/cart/items/{product_id}", self.base_url);
        self.request_snapshot(self.client.delete(&url)).await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<CartSnapshot, GatewayError> {
        let url = format!("{}/api/cart", self.base_url);
        self.request_snapshot(self.client.delete(&url)).await
    }

    /// Send a request and decode the response snapshot.
    async fn request_snapshot(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<CartSnapshot, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

/// Pull the `message` field out of an error body, falling back to the raw
/// (truncated) text for APIs that answer with plain strings.
fn extract_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    body.chars().take(200).collect()
}
