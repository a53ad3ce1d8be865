//! Integration tests for Tally.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tally-integration-tests
//! ```
//!
//! The tests need no external services: [`TestBackend`] serves the inventory
//! API from an in-process `axum` router on an ephemeral port, and cache tests
//! run against a temporary directory.
//!
//! # Test Categories
//!
//! - `remote_products` - Product store against the HTTP backend
//! - `remote_purchases` - Purchase store against the HTTP backend
//! - `local_cache` - Product store over a file cache
//! - `app_context` - Both stores wired together

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;

/// How the backend misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Answer normally.
    #[default]
    None,
    /// `503 Service Unavailable` on every route.
    Unavailable,
    /// `200 OK` with a body that is not JSON.
    Malformed,
    /// Accept purchases but echo them back without an `id`.
    OmitIds,
    /// Answer normally after the given delay.
    Slow(Duration),
}

#[derive(Default)]
struct BackendState {
    products: Vec<Value>,
    purchases: Vec<Value>,
    next_id: u64,
    fault: Fault,
    product_requests: usize,
}

type SharedState = Arc<Mutex<BackendState>>;

/// In-process fake of the inventory service.
///
/// Routes (under `/api`):
/// - `GET /products` - the configured product records
/// - `GET /purchases` - every purchase accepted so far
/// - `POST /purchases` - store the body with a numeric `id` and echo it back
pub struct TestBackend {
    addr: SocketAddr,
    state: SharedState,
    server: JoinHandle<()>,
}

impl TestBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = SharedState::default();
        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/purchases", get(list_purchases).post(create_purchase))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test backend stopped");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to hand to the HTTP client.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Replace the product records served by `GET /products`.
    pub fn set_products(&self, products: Vec<Value>) {
        self.state.lock().products = products;
    }

    /// Seed the purchase ledger without going through `POST`.
    pub fn set_purchases(&self, purchases: Vec<Value>) {
        self.state.lock().purchases = purchases;
    }

    pub fn set_fault(&self, fault: Fault) {
        self.state.lock().fault = fault;
    }

    /// Purchases stored by the backend.
    #[must_use]
    pub fn purchases(&self) -> Vec<Value> {
        self.state.lock().purchases.clone()
    }

    /// Number of `GET /products` requests served.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.lock().product_requests
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Apply the current fault. Returns a response to send instead, if any.
async fn injected(state: &SharedState) -> Option<Response> {
    let fault = state.lock().fault;
    match fault {
        Fault::None | Fault::OmitIds => None,
        Fault::Unavailable => Some((StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response()),
        Fault::Malformed => Some((StatusCode::OK, "<html>not json</html>").into_response()),
        Fault::Slow(delay) => {
            tokio::time::sleep(delay).await;
            None
        }
    }
}

async fn list_products(State(state): State<SharedState>) -> Response {
    state.lock().product_requests += 1;
    if let Some(response) = injected(&state).await {
        return response;
    }
    let products = state.lock().products.clone();
    Json(products).into_response()
}

async fn list_purchases(State(state): State<SharedState>) -> Response {
    if let Some(response) = injected(&state).await {
        return response;
    }
    let purchases = state.lock().purchases.clone();
    Json(purchases).into_response()
}

async fn create_purchase(State(state): State<SharedState>, Json(mut body): Json<Value>) -> Response {
    if let Some(response) = injected(&state).await {
        return response;
    }
    let mut state = state.lock();
    if state.fault == Fault::OmitIds {
        return (StatusCode::CREATED, Json(body)).into_response();
    }
    state.next_id += 1;
    if let Some(record) = body.as_object_mut() {
        record.insert("id".to_string(), Value::from(state.next_id));
    }
    state.purchases.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}
