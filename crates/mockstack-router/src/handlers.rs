//! HTTP handlers.
//!
//! Implements:
//! - GET /health - Health check endpoint
//! - everything else - routed through the [`SessionRouter`]

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use mockstack_core::{MockRequest, MockResponse};
use serde::Serialize;
use tracing::debug;

use crate::error::RouterError;
use crate::router::SessionRouter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SessionRouter>,
    pub max_body_bytes: usize,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub sessions: usize,
}

/// GET /health - Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.router.registry().len(),
    })
}

/// Route any other request through the session router.
///
/// Session dispatch holds a per-session lock for the whole engine call, so it
/// runs on the blocking pool rather than on an async worker.
pub async fn dispatch_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, RouterError> {
    let (parts, body) = req.into_parts();

    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| RouterError::InvalidBody(e.to_string()))?;

    let path = parts.uri.path().to_string();
    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let request = MockRequest::new(url).with_body(body);

    debug!("Dispatching {} {}", parts.method, path);

    let router = Arc::clone(&state.router);
    let method = parts.method;
    let headers = parts.headers;
    let result = tokio::task::spawn_blocking(move || {
        router.handle(&method, &request, &path, &headers)
    })
    .await
    .map_err(|e| RouterError::Internal(format!("Dispatch task failed: {}", e)))?;

    into_http_response(result)
}

fn into_http_response(result: MockResponse) -> Result<Response, RouterError> {
    let status = StatusCode::from_u16(result.status)
        .map_err(|_| RouterError::Internal(format!("Invalid status code {}", result.status)))?;

    let mut response = Response::new(Body::from(result.body));
    *response.status_mut() = status;
    *response.headers_mut() = result.headers;
    Ok(response)
}
