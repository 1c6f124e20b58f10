//! Per-worker browser sessions.
//!
//! A worker is one lane of scenario execution. Each worker owns at most one
//! session at a time; sessions are never handed across workers.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::error::Result;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

pub struct SessionRegistry<S> {
    sessions: Mutex<HashMap<WorkerId, Arc<S>>>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl<S: BrowserSession> SessionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a session for `worker` unless one is already active, and returns it.
    pub async fn initialize<L>(&self, worker: WorkerId, launcher: &L) -> Result<Arc<S>>
    where
        L: SessionLauncher<Session = S> + ?Sized,
    {
        if let Some(existing) = self.current(worker) {
            debug!("Reusing active session for {}", worker);
            return Ok(existing);
        }

        let session = Arc::new(launcher.launch().await?);
        info!("Started browser session for {}", worker);
        // Only this worker inserts under its own key, so nothing can race in here.
        self.sessions.lock().insert(worker, Arc::clone(&session));
        Ok(session)
    }

    /// The active session for `worker`, or `None` before `initialize`.
    pub fn current(&self, worker: WorkerId) -> Option<Arc<S>> {
        self.sessions.lock().get(&worker).cloned()
    }

    /// Closes and forgets the worker's session. Does nothing when none is active.
    pub async fn teardown(&self, worker: WorkerId) -> Result<()> {
        let session = self.sessions.lock().remove(&worker);
        match session {
            Some(session) => {
                info!("Closing browser session for {}", worker);
                session.close().await
            }
            None => Ok(()),
        }
    }

    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
