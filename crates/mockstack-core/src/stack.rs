//! The dispatch engine: a set of named services behind one routing base.

use std::panic::{catch_unwind, AssertUnwindSafe};

use http::{HeaderMap, Method};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::message::{
    MockRequest, MockResponse, STATUS_ROUTE_NOT_HANDLED, STATUS_SERVICE_FAILURE,
    STATUS_UNKNOWN_SERVICE,
};
use crate::service::{Call, Holds, Service};

/// One engine instance.
///
/// Requests are routed by their first path segment to the service registered
/// under that name; the rest of the path is handed to the service. The engine
/// is not internally synchronized: callers that share it must serialize access.
pub struct MockStack {
    base_url: String,
    services: Vec<Box<dyn Service>>,
    holds: Holds,
}

impl MockStack {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            services: Vec::new(),
            holds: Holds::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Register a service instance. Names must be unique path segments.
    pub fn register(&mut self, service: Box<dyn Service>) -> Result<(), EngineError> {
        let name = service.name();
        if name.is_empty() || name.contains('/') {
            return Err(EngineError::InvalidServiceName(name.to_string()));
        }
        if self.services.iter().any(|s| s.name() == name) {
            return Err(EngineError::ServiceAlreadyRegistered(name.to_string()));
        }
        debug!("{}: registered service {}", self.base_url, name);
        self.services.push(service);
        Ok(())
    }

    /// Names of the registered services, in registration order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Drop every registered service and all held values.
    pub fn reset(&mut self) {
        debug!("{}: reset", self.base_url);
        self.services.clear();
        self.holds.clear();
    }

    pub fn into_hold(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.holds.insert(name.into(), value);
    }

    pub fn from_hold(&self, name: &str) -> Option<&serde_json::Value> {
        self.holds.get(name)
    }

    /// Route a request to the service named by the first segment of `path`.
    pub fn dispatch(
        &mut self,
        method: &Method,
        request: &MockRequest,
        path: &str,
        headers: &HeaderMap,
    ) -> MockResponse {
        let (name, service_path) = split_service_path(path);

        let holds = &mut self.holds;
        let Some(service) = self.services.iter_mut().find(|s| s.name() == name) else {
            debug!("{}: no service for {:?}", self.base_url, name);
            return MockResponse::text(STATUS_UNKNOWN_SERVICE, "Unknown service");
        };

        let call = Call {
            method,
            request,
            path: &service_path,
            headers,
        };

        match catch_unwind(AssertUnwindSafe(|| service.handle(&call, holds))) {
            Ok(Some(response)) => response,
            Ok(None) => {
                debug!(
                    "{}: {} {} not handled by {}",
                    self.base_url, method, service_path, name
                );
                MockResponse::text(STATUS_ROUTE_NOT_HANDLED, "Route not handled")
            }
            Err(_) => {
                warn!(
                    "{}: service {} panicked on {} {}",
                    self.base_url, name, method, service_path
                );
                MockResponse::text(STATUS_SERVICE_FAILURE, "Service handler failed")
            }
        }
    }
}

impl std::fmt::Debug for MockStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStack")
            .field("base_url", &self.base_url)
            .field("services", &self.service_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Split `/name/rest` into `("name", "/rest")`; an empty rest becomes `/`.
fn split_service_path(path: &str) -> (&str, String) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((name, rest)) => (name, format!("/{}", rest)),
        None => (trimmed, "/".to_string()),
    }
}
