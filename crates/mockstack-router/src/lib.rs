//! Session-isolating HTTP router for the mockstack dispatch engine.
//!
//! Many independent [`MockStack`](mockstack_core::MockStack) instances live
//! behind one process, each addressed by the first segment of the URL path:
//! - `/<session-id>/...` is dispatched to that session's engine
//! - `/<admin-prefix>/...` manages sessions (create, list, reset, remove)

pub mod admin;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod session;

use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use admin::AdminController;
pub use config::{BuiltinService, Config};
pub use error::{RouterError, SessionError};
pub use handlers::AppState;
pub use router::{Route, SessionRouter};
pub use session::{ResetPolicy, SessionRecord, SessionRegistry, SessionSnapshot};

/// Build the HTTP application around a shared [`SessionRouter`].
pub fn app(state: AppState) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/health", get(handlers::health_handler))
        .fallback(handlers::dispatch_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
