//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the LLM gateway and a map of live sessions. Sessions are memory
//! only and live until the client deletes them or the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::gateway::Gateway;
use crate::session::driver::{self, SessionHandle};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Register an empty session and return its id.
    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let handle = driver::new_handle(self.gateway.models().clone());
        self.sessions.write().await.insert(id, handle);
        id
    }

    pub async fn session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drop a session from the map and cancel its live generation.
    ///
    /// Tasks still holding the handle finish against the detached session.
    pub async fn remove_session(&self, id: Uuid) -> Option<SessionHandle> {
        let handle = self.sessions.write().await.remove(&id)?;
        driver::lock(&handle).reset();
        Some(handle)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
