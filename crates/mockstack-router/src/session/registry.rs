//! Process-wide map of session id to [`SessionRecord`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use mockstack_core::ServiceDescriptor;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::record::SessionRecord;
use crate::error::SessionError;

/// What a reset does to a session's metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResetPolicy {
    /// Reset in place, keeping the id and creation time.
    #[default]
    Preserve,
    /// Replace the record with a freshly built one.
    Recreate,
}

/// Tracks every live session and the services new sessions are built with.
///
/// The map lock is only held for lookups and structural changes. It is never
/// held while a session lock is taken, and session operations never reach back
/// into the map.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<SessionRecord>>>,
    services: RwLock<Vec<ServiceDescriptor>>,
    reset_policy: ResetPolicy,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_reset_policy(ResetPolicy::default())
    }

    pub fn with_reset_policy(reset_policy: ResetPolicy) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            services: RwLock::new(Vec::new()),
            reset_policy,
        }
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    /// Add a service to every session created from now on.
    pub fn register_service(&self, service: ServiceDescriptor) {
        debug!("Adding service {}", service.name());
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(service);
    }

    /// Snapshot of the registered services, in registration order.
    pub fn services(&self) -> Vec<ServiceDescriptor> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Create a session, generating an id when none is requested.
    ///
    /// Creating an id that already exists is a no-op returning that id.
    #[instrument(skip(self), level = "debug")]
    pub fn create_session(&self, requested_id: Option<&str>) -> Result<String, SessionError> {
        let session_id = match requested_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        if self.contains(&session_id) {
            debug!("Session {} already exists", session_id);
            return Ok(session_id);
        }

        // Build outside the map lock; a failed build leaves no entry behind.
        let record = SessionRecord::new(session_id.clone(), &self.services())
            .inspect_err(|e| warn!("Failed to create session {}: {}", session_id, e))?;

        let mut sessions = self.lock_sessions();
        if sessions.contains_key(&session_id) {
            debug!("Session {} created concurrently, keeping existing", session_id);
        } else {
            sessions.insert(session_id.clone(), Arc::new(record));
            info!("Created session {}", session_id);
        }
        Ok(session_id)
    }

    /// Return a session to its initial state, keeping its id.
    #[instrument(skip(self), level = "debug")]
    pub fn reset_session(&self, session_id: &str) -> Result<(), SessionError> {
        match self.reset_policy {
            ResetPolicy::Preserve => {
                let record = self
                    .lookup_session(session_id)
                    .ok_or_else(|| SessionError::InvalidSessionId(session_id.to_string()))?;
                record.reset()?;
            }
            ResetPolicy::Recreate => {
                if !self.contains(session_id) {
                    return Err(SessionError::InvalidSessionId(session_id.to_string()));
                }
                let fresh = Arc::new(SessionRecord::new(session_id, &self.services())?);

                let mut sessions = self.lock_sessions();
                let slot = sessions
                    .get_mut(session_id)
                    .ok_or_else(|| SessionError::InvalidSessionId(session_id.to_string()))?;
                let evicted = std::mem::replace(slot, fresh);
                drop(sessions);
                drop(evicted);
            }
        }
        info!("Reset session {}", session_id);
        Ok(())
    }

    /// Delete a session. In-flight requests on it run to completion.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_session(&self, session_id: &str) -> Result<(), SessionError> {
        let evicted = self.lock_sessions().remove(session_id);
        match evicted {
            Some(_) => {
                info!("Removed session {}", session_id);
                Ok(())
            }
            None => Err(SessionError::InvalidSessionId(session_id.to_string())),
        }
    }

    pub fn lookup_session(&self, session_id: &str) -> Option<Arc<SessionRecord>> {
        self.lock_sessions().get(session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock_sessions().contains_key(session_id)
    }

    /// Ids of all live sessions, sorted.
    pub fn list_session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<SessionRecord>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
