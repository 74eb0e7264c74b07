//! HTTP request handling.
//!
//! A single endpoint accepts a `ValuesRequest` JSON body on any method and
//! answers with a `ValuesResponse`, or `400 Bad Request` for any failure.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use sheetsproxy_core::{ValuesRequest, ValuesResponse, normalize_rows};
use tracing::{debug, info};

use crate::cache::ClientCache;
use crate::error::{ProxyError, ProxyResult};
use crate::setup::ClientFactory;
use crate::sheets::SheetsClient;

/// State shared by every request.
#[derive(Debug)]
pub struct AppState {
    cache: ClientCache,
    factory: ClientFactory,
    sheets: SheetsClient,
}

/// Shared state handle.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Creates the state with an empty client cache.
    pub fn new(factory: ClientFactory, sheets: SheetsClient) -> Self {
        Self {
            cache: ClientCache::new(),
            factory,
            sheets,
        }
    }

    /// Returns the client cache.
    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }
}

/// Builds the proxy router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", any(handle_values))
        .with_state(state)
}

async fn handle_values(State(state): State<SharedState>, body: Result<Bytes, BytesRejection>) -> Response {
    match fetch_values(&state, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn fetch_values(state: &AppState, body: Result<Bytes, BytesRejection>) -> ProxyResult<Response> {
    let client = state
        .cache
        .get_or_try_init(|| state.factory.build())
        .await?;

    let body = body.map_err(|e| ProxyError::Input(format!("unreadable body: {}", e)))?;
    let request: ValuesRequest = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::Input(format!("malformed body: {}", e)))?;
    request
        .validate()
        .map_err(|reason| ProxyError::Input(reason.to_string()))?;
    debug!(spreadsheet_id = %request.spreadsheet_id, range = %request.range, "handling request");

    let rows = state
        .sheets
        .get_values(&client, &request.spreadsheet_id, &request.range)
        .await?;
    let response = ValuesResponse::new(request, normalize_rows(rows));
    let encoded = serde_json::to_vec(&response)?;

    info!(
        spreadsheet_id = %response.request.spreadsheet_id,
        rows = response.values.len(),
        "served values"
    );
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], encoded).into_response())
}
