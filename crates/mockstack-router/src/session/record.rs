//! One isolated engine instance plus its access trackers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use http::{HeaderMap, Method};
use mockstack_core::{MockRequest, MockResponse, MockStack, ServiceDescriptor};
use tracing::{debug, warn};

use crate::error::SessionError;

/// A session: a private [`MockStack`] guarded by its own lock.
///
/// The engine is not thread-safe, so every call into it, and every tracker
/// update, happens while holding `state`. Requests to one session serialize;
/// requests to different sessions never contend.
pub struct SessionRecord {
    id: String,
    services: Arc<[ServiceDescriptor]>,
    created_at: DateTime<Utc>,
    state: Mutex<RecordState>,
}

struct RecordState {
    stack: MockStack,
    last_accessed_at: DateTime<Utc>,
    access_count: u64,
    status_counters: BTreeMap<u16, u64>,
}

/// Point-in-time copy of a session's trackers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    pub status_counters: BTreeMap<u16, u64>,
}

impl SessionRecord {
    /// Build a session with one fresh instance of every service.
    pub fn new(id: impl Into<String>, services: &[ServiceDescriptor]) -> Result<Self, SessionError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SessionError::InvalidSessionId(id));
        }
        if services.is_empty() {
            return Err(SessionError::NoServicesProvided);
        }

        debug!("Session {}: creating with {} services", id, services.len());
        let services: Arc<[ServiceDescriptor]> = services.into();
        let stack = build_stack(&id, &services)?;
        let created_at = Utc::now();

        Ok(Self {
            id,
            services,
            created_at,
            state: Mutex::new(RecordState {
                stack,
                last_accessed_at: created_at,
                access_count: 0,
                status_counters: BTreeMap::new(),
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The descriptors this session was built from.
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn base_url(&self) -> String {
        self.lock().stack.base_url().to_string()
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.lock().last_accessed_at
    }

    pub fn access_count(&self) -> u64 {
        self.lock().access_count
    }

    pub fn status_counters(&self) -> BTreeMap<u16, u64> {
        self.lock().status_counters.clone()
    }

    /// Read every tracker under a single lock acquisition.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            id: self.id.clone(),
            created_at: self.created_at,
            last_accessed_at: state.last_accessed_at,
            access_count: state.access_count,
            status_counters: state.status_counters.clone(),
        }
    }

    /// Throw away all engine state and rebuild the services.
    ///
    /// `id` and `created_at` survive; the access trackers start over from the
    /// moment of the reset. The replacement engine is built before anything
    /// is touched, so a failed rebuild leaves the session as it was.
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut stack = build_stack(&self.id, &self.services)?;

        let mut state = self.lock();
        stack.set_base_url(state.stack.base_url());
        state.stack = stack;
        state.last_accessed_at = Utc::now();
        state.access_count = 0;
        state.status_counters.clear();

        debug!("Session {}: reset complete", self.id);
        Ok(())
    }

    /// Forward a request to this session's engine and track the outcome.
    pub fn dispatch(
        &self,
        method: &Method,
        request: &MockRequest,
        path: &str,
        headers: &HeaderMap,
    ) -> MockResponse {
        let mut state = self.lock();
        state.access_count += 1;
        state.last_accessed_at = Utc::now();

        let response = state.stack.dispatch(method, request, path, headers);
        *state.status_counters.entry(response.status).or_insert(0) += 1;
        response
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        debug!("Session {}: waiting for lock", self.id);
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Session {}: recovering poisoned lock", self.id);
            PoisonError::into_inner(poisoned)
        })
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

fn build_stack(id: &str, services: &[ServiceDescriptor]) -> Result<MockStack, SessionError> {
    let mut stack = MockStack::new(id);
    for descriptor in services {
        debug!("Session {}: initializing service {}", id, descriptor.name());
        stack
            .register(descriptor.build())
            .map_err(|e| SessionError::InvalidServiceList(e.to_string()))?;
    }
    Ok(stack)
}
