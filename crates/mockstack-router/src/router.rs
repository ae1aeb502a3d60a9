//! Per-request routing between the admin API and individual sessions.

use std::sync::{Arc, LazyLock};

use http::{HeaderMap, Method};
use mockstack_core::{MockRequest, MockResponse};
use regex::Regex;
use tracing::debug;

use crate::admin::AdminController;
use crate::error::{Result, RouterError};
use crate::session::{SessionRecord, SessionRegistry};

/// `/<id>` optionally followed by `/<anything>`.
static SESSION_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_-]+)(/.*)?$").expect("session path pattern is valid")
});

static SESSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("session id pattern is valid"));

/// Whether `id` could be addressed as the first segment of a path.
pub fn is_valid_session_id(id: &str) -> bool {
    SESSION_ID.is_match(id)
}

/// Split `/<id>/rest` into `(id, "/rest")`. The rest is empty when the path
/// ends right after the id.
pub fn extract_session_id(path: &str) -> Option<(&str, &str)> {
    let captures = SESSION_PATH.captures(path)?;
    let id = captures.get(1)?.as_str();
    let rest = captures.get(2).map_or("", |m| m.as_str());
    Some((id, rest))
}

/// Where a request ends up. Re-derived from the path on every request.
#[derive(Debug)]
pub enum Route<'a> {
    /// Under the admin prefix; `path` is relative to it.
    Admin { path: &'a str },
    /// No session id could be extracted.
    NoSessionId,
    /// Well-formed id that names no live session.
    UnknownSession { session_id: &'a str },
    /// A live session; `path` has the id segment stripped.
    Session {
        record: Arc<SessionRecord>,
        path: &'a str,
    },
}

/// Top-level dispatch surface combining the admin API and session routing.
pub struct SessionRouter {
    registry: Arc<SessionRegistry>,
    admin: AdminController,
    admin_mount: String,
}

impl std::fmt::Debug for SessionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRouter")
            .field("admin_mount", &self.admin_mount)
            .finish_non_exhaustive()
    }
}

impl SessionRouter {
    pub const DEFAULT_ADMIN_PREFIX: &'static str = "admin";

    pub fn new(registry: Arc<SessionRegistry>, admin: AdminController) -> Self {
        Self {
            registry,
            admin,
            admin_mount: format!("/{}", Self::DEFAULT_ADMIN_PREFIX),
        }
    }

    /// Mount the admin API under another segment. Surrounding `/` are
    /// ignored; what remains must be a single segment of the session id
    /// grammar, otherwise it would swallow session or root paths.
    pub fn with_admin_prefix(
        registry: Arc<SessionRegistry>,
        admin: AdminController,
        admin_prefix: &str,
    ) -> Result<Self> {
        let segment = admin_prefix.trim_matches('/');
        if !is_valid_session_id(segment) {
            return Err(RouterError::Configuration(format!(
                "Invalid admin prefix {:?}",
                admin_prefix
            )));
        }
        Ok(Self {
            registry,
            admin,
            admin_mount: format!("/{}", segment),
        })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn admin(&self) -> &AdminController {
        &self.admin
    }

    /// Decide where `path` goes without side effects on any session.
    pub fn resolve<'a>(&self, path: &'a str) -> Route<'a> {
        if let Some(rest) = path.strip_prefix(self.admin_mount.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                return Route::Admin { path: rest };
            }
        }

        let Some((session_id, rest)) = extract_session_id(path) else {
            debug!("Failed to find any session id in {}", path);
            return Route::NoSessionId;
        };

        match self.registry.lookup_session(session_id) {
            Some(record) => Route::Session {
                record,
                path: if rest.is_empty() { "/" } else { rest },
            },
            None => Route::UnknownSession { session_id },
        }
    }

    /// Route one request and produce its response. Never fails: routing
    /// errors come back as HTTP-shaped responses.
    pub fn handle(
        &self,
        method: &Method,
        request: &MockRequest,
        path: &str,
        headers: &HeaderMap,
    ) -> MockResponse {
        match self.resolve(path) {
            Route::Admin { path: admin_path } => {
                debug!("Admin request {} {}", method, admin_path);
                self.admin.handle(method, admin_path, headers)
            }
            Route::NoSessionId => RouterError::MissingSession.to_mock_response(),
            Route::UnknownSession { session_id } => {
                debug!("Failed to find a matching session for {}", session_id);
                RouterError::UnknownSession(session_id.to_string()).to_mock_response()
            }
            Route::Session {
                record,
                path: session_path,
            } => {
                debug!(
                    "Session {}: {} {} -> {}",
                    record.id(),
                    method,
                    path,
                    session_path
                );
                record.dispatch(method, request, session_path, headers)
            }
        }
    }
}
