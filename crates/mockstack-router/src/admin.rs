//! RESTful session administration.
//!
//! Mounted under the admin prefix:
//! - `POST /`      create a session (`x-session-id` optional)
//! - `DELETE /`    remove the session named by `x-session-id`
//! - `PUT /`       reset the session named by `x-session-id`
//! - `GET /`       list sessions and services
//! - `GET /<id>`   describe one session

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue, LOCATION};
use http::{HeaderMap, Method};
use mockstack_core::{MockResponse, ServiceDescriptor, STATUS_ROUTE_NOT_HANDLED};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, RouterError};
use crate::router::{extract_session_id, is_valid_session_id};
use crate::session::SessionRegistry;

/// Header carrying the caller-chosen or server-assigned session id.
pub const SESSION_ID_HEADER: &str = "x-session-id";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Serialize)]
struct SessionList<'a> {
    base_url: &'a str,
    services: BTreeMap<String, String>,
    sessions: Vec<String>,
}

#[derive(Serialize)]
struct SessionDetail<'a> {
    base_url: &'a str,
    services: BTreeMap<String, String>,
    session_valid: bool,
    #[serde(rename = "created-time")]
    created_time: Option<String>,
    #[serde(rename = "accessed-time")]
    accessed_time: Option<String>,
    #[serde(rename = "accessed-count")]
    accessed_count: u64,
    status: BTreeMap<String, u64>,
}

/// Handles the admin route on top of a shared [`SessionRegistry`].
pub struct AdminController {
    registry: Arc<SessionRegistry>,
    base_uri: String,
}

impl AdminController {
    /// `base_uri` is where sessions are reachable, e.g. `http://localhost:8081`.
    pub fn new(registry: Arc<SessionRegistry>, base_uri: &str) -> Self {
        Self {
            registry,
            base_uri: normalize_base_uri(base_uri),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Absolute location of a session.
    pub fn session_uri(&self, session_id: &str) -> String {
        format!("{}/{}/", self.base_uri, session_id)
    }

    /// Handle a request whose path is relative to the admin prefix.
    pub fn handle(&self, method: &Method, path: &str, headers: &HeaderMap) -> MockResponse {
        let result = match (method, path) {
            (&Method::POST, "" | "/") => self.create_session(headers),
            (&Method::DELETE, "" | "/") => self.remove_session(headers),
            (&Method::PUT, "" | "/") => self.reset_session(headers),
            (&Method::GET, "" | "/") => Ok(self.list_sessions()),
            (&Method::GET, _) => match extract_session_id(path) {
                Some((session_id, "" | "/")) => Ok(self.describe_session(session_id)),
                _ => Ok(route_not_handled()),
            },
            _ => Ok(route_not_handled()),
        };

        result.unwrap_or_else(|e| {
            debug!("Admin {} {} failed: {}", method, path, e);
            e.to_mock_response()
        })
    }

    /// `POST /`: 201 with `x-session-id` and `location`.
    pub fn create_session(&self, headers: &HeaderMap) -> Result<MockResponse> {
        let requested = session_id_from_headers(headers)?;
        if let Some(id) = requested {
            if !is_valid_session_id(id) {
                return Err(RouterError::MalformedSessionId(id.to_string()));
            }
        }

        let session_id = self.registry.create_session(requested)?;
        let location = self.session_uri(&session_id);

        Ok(MockResponse::new(201)
            .with_header(
                HeaderName::from_static(SESSION_ID_HEADER),
                header_value(&session_id)?,
            )
            .with_header(LOCATION, header_value(&location)?))
    }

    /// `DELETE /`: 204, or 404 for an unknown id.
    pub fn remove_session(&self, headers: &HeaderMap) -> Result<MockResponse> {
        let session_id = session_id_from_headers(headers)?.unwrap_or_default();
        self.registry.remove_session(session_id)?;
        Ok(MockResponse::new(204))
    }

    /// `PUT /`: 205, or 404 for an unknown id.
    pub fn reset_session(&self, headers: &HeaderMap) -> Result<MockResponse> {
        let session_id = session_id_from_headers(headers)?.unwrap_or_default();
        self.registry.reset_session(session_id)?;
        Ok(MockResponse::new(205))
    }

    /// `GET /`: every live session and the services new sessions get.
    pub fn list_sessions(&self) -> MockResponse {
        let body = SessionList {
            base_url: &self.base_uri,
            services: service_labels(&self.registry.services()),
            sessions: self.registry.list_session_ids(),
        };
        MockResponse::json(200, &body)
    }

    /// `GET /<id>`: always 200; `session_valid` tells whether the id exists.
    ///
    /// Reading the trackers does not count as an access. A live session lists
    /// the services it was built with, not the ones registered since.
    pub fn describe_session(&self, session_id: &str) -> MockResponse {
        let body = match self.registry.lookup_session(session_id) {
            Some(record) => {
                let snapshot = record.snapshot();
                SessionDetail {
                    base_url: &self.base_uri,
                    services: service_labels(record.services()),
                    session_valid: true,
                    created_time: Some(format_timestamp(snapshot.created_at)),
                    accessed_time: Some(format_timestamp(snapshot.last_accessed_at)),
                    accessed_count: snapshot.access_count,
                    status: snapshot
                        .status_counters
                        .iter()
                        .map(|(status, count)| (status.to_string(), *count))
                        .collect(),
                }
            }
            None => SessionDetail {
                base_url: &self.base_uri,
                services: service_labels(&self.registry.services()),
                session_valid: false,
                created_time: None,
                accessed_time: None,
                accessed_count: 0,
                status: BTreeMap::new(),
            },
        };
        MockResponse::json(200, &body)
    }
}

/// Strip one leading and one trailing `/`.
pub fn normalize_base_uri(base_uri: &str) -> String {
    let base_uri = base_uri.strip_prefix('/').unwrap_or(base_uri);
    let base_uri = base_uri.strip_suffix('/').unwrap_or(base_uri);
    base_uri.to_string()
}

fn service_labels(services: &[ServiceDescriptor]) -> BTreeMap<String, String> {
    services
        .iter()
        .map(|s| (s.name().to_string(), s.type_label().to_string()))
        .collect()
}

/// `None` for a missing or blank header. A header that is present but not
/// visible ASCII is rejected instead of being ignored.
fn session_id_from_headers(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(SESSION_ID_HEADER) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        RouterError::MalformedSessionId(String::from_utf8_lossy(value.as_bytes()).into_owned())
    })?;
    let value = value.trim();
    Ok((!value.is_empty()).then_some(value))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RouterError::Internal(format!("Invalid header value {:?}: {}", value, e)))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn route_not_handled() -> MockResponse {
    MockResponse::text(STATUS_ROUTE_NOT_HANDLED, "Route not handled")
}
