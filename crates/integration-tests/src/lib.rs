//! Test support for the Pantry cart engine.
//!
//! Provides [`StubCartServer`], an in-process axum implementation of the
//! backend cart endpoints. It enforces the bearer credential, keeps one
//! cart in memory, and implements the additive add-item semantics the real
//! backend guarantees, so integration tests can drive the engine over real
//! HTTP round trips.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use tokio::net::TcpListener;

use pantry_core::{CartItem, CartSnapshot, ProductId, ProductRef};

/// Bearer token the stub accepts. Everything else gets a 401.
pub const TEST_TOKEN: &str = "test-bearer-token";

/// In-memory state behind the stub endpoints.
pub struct StubState {
    catalog: HashMap<ProductId, ProductRef>,
    lines: Mutex<Vec<(ProductId, u32)>>,
    add_calls: AtomicUsize,
}

impl StubState {
    fn new(catalog: Vec<ProductRef>) -> Self {
        Self {
            catalog: catalog
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
            lines: Mutex::new(Vec::new()),
            add_calls: AtomicUsize::new(0),
        }
    }

    /// Put a line directly into the server cart, bypassing HTTP.
    ///
    /// Used to simulate a cart left over from a previous session.
    pub fn seed_line(&self, product_id: impl Into<ProductId>, quantity: u32) {
        self.lines
            .lock()
            .expect("lines lock")
            .push((product_id.into(), quantity));
    }

    /// Quantity of a product currently in the server cart.
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .lock()
            .expect("lines lock")
            .iter()
            .find(|(id, _)| id == product_id)
            .map_or(0, |(_, qty)| *qty)
    }

    /// How many add-item requests the stub has served.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Materialize the current cart as a wire snapshot.
    fn snapshot(&self) -> CartSnapshot {
        let lines = self.lines.lock().expect("lines lock");
        let items = lines
            .iter()
            .filter_map(|(id, quantity)| {
                self.catalog.get(id).map(|product| CartItem {
                    product: product.clone(),
                    quantity: *quantity,
                    line_key: format!("srv-{id}"),
                })
            })
            .collect();
        CartSnapshot::from_items(items)
    }
}

/// Handle to a running stub server.
pub struct StubCartServer {
    base_url: String,
    state: Arc<StubState>,
}

impl StubCartServer {
    /// Bind an ephemeral port and serve the cart endpoints with the given
    /// catalog.
    pub async fn spawn(catalog: Vec<ProductRef>) -> Self {
        init_tracing();

        let state = Arc::new(StubState::new(catalog));
        let app = Router::new()
            .route("/api/cart", get(fetch_cart).delete(clear_cart))
            .route("/api/cart/items", post(add_item))
            .route(
                "/api/cart/items/{product_id}",
                put(update_item).delete(remove_item),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Base URL to point the cart engine at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared in-memory state, for seeding and assertions.
    #[must_use]
    pub fn state(&self) -> &StubState {
        &self.state
    }
}

/// A small grocery catalog shared by the scenario tests.
#[must_use]
pub fn grocery_catalog() -> Vec<ProductRef> {
    use rust_decimal::Decimal;

    vec![
        ProductRef::new("rice-10kg", "Basmati Rice 10kg", Decimal::new(2399, 2)),
        ProductRef::new("oil-5l", "Olive Oil 5L", Decimal::new(5000, 2)),
        ProductRef::new("beans-case", "Black Beans Case", Decimal::new(3000, 2)),
        ProductRef::new("flour-25kg", "Bread Flour 25kg", Decimal::new(1875, 2)),
    ]
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Deserialize)]
struct UpdateItemBody {
    quantity: u32,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

fn check_auth(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    let ok = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if ok {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::UNAUTHORIZED,
            "missing or invalid credential",
        ))
    }
}

async fn fetch_cart(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    Json(state.snapshot()).into_response()
}

async fn add_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    state.add_calls.fetch_add(1, Ordering::SeqCst);

    if !state.catalog.contains_key(&body.product_id) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "unknown product");
    }
    if body.quantity == 0 {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "quantity out of bounds");
    }

    {
        let mut lines = state.lines.lock().expect("lines lock");
        if let Some(line) = lines.iter_mut().find(|(id, _)| *id == body.product_id) {
            // Additive semantics: adding an existing product increments
            line.1 += body.quantity;
        } else {
            lines.push((body.product_id, body.quantity));
        }
    }
    Json(state.snapshot()).into_response()
}

async fn update_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    let product_id = ProductId::new(product_id);
    if body.quantity == 0 {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "quantity out of bounds");
    }

    {
        let mut lines = state.lines.lock().expect("lines lock");
        let Some(line) = lines.iter_mut().find(|(id, _)| *id == product_id) else {
            return error_response(StatusCode::NOT_FOUND, "product not in cart");
        };
        line.1 = body.quantity;
    }
    Json(state.snapshot()).into_response()
}

async fn remove_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    let product_id = ProductId::new(product_id);
    state
        .lines
        .lock()
        .expect("lines lock")
        .retain(|(id, _)| *id != product_id);
    Json(state.snapshot()).into_response()
}

async fn clear_cart(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    state.lines.lock().expect("lines lock").clear();
    Json(state.snapshot()).into_response()
}
