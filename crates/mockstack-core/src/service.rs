use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method};

use crate::message::{MockRequest, MockResponse};

/// Values shared between the services of one engine instance.
pub type Holds = HashMap<String, serde_json::Value>;

/// A single request as seen by a service.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub method: &'a Method,
    pub request: &'a MockRequest,
    /// Path relative to the service, always starting with `/`.
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

/// A mock service registered with a [`MockStack`](crate::MockStack).
///
/// Services are owned by exactly one engine instance and are never called
/// concurrently, so they may keep plain mutable state.
pub trait Service: Send {
    /// Name used as the first path segment to reach this service.
    fn name(&self) -> &str;

    /// Human-readable label for listings, the bare type name by default.
    fn type_label(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Handle a call. `None` means no route of this service matches.
    fn handle(&mut self, call: &Call<'_>, holds: &mut Holds) -> Option<MockResponse>;
}

type BuildFn = dyn Fn() -> Box<dyn Service> + Send + Sync;

/// Recipe for producing fresh instances of one service.
///
/// Every session gets its own instances, built from the same descriptors.
#[derive(Clone)]
pub struct ServiceDescriptor {
    name: String,
    type_label: String,
    build: Arc<BuildFn>,
}

impl ServiceDescriptor {
    /// Descriptor for a service type with a `Default` constructor.
    pub fn of<S>() -> Self
    where
        S: Service + Default + 'static,
    {
        let probe = S::default();
        Self {
            name: probe.name().to_string(),
            type_label: probe.type_label().to_string(),
            build: Arc::new(|| -> Box<dyn Service> { Box::new(S::default()) }),
        }
    }

    /// Descriptor backed by an arbitrary constructor.
    pub fn new<F>(name: impl Into<String>, type_label: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> Box<dyn Service> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    pub fn build(&self) -> Box<dyn Service> {
        (self.build)()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("type_label", &self.type_label)
            .finish_non_exhaustive()
    }
}
