//! Interactive shell session registry.
//!
//! Shell sessions are spawned by tools but outlive the triggering tool call,
//! so the runner sweeps the registry at the end of every run whether or not
//! a shell tool ran. The store is injected into the runner (no ambient
//! global) and shared across concurrent runs; `DashMap` provides the
//! internal exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error};

/// Error closing an interactive session.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ShellCloseError(pub String);

/// A live interactive shell session.
#[async_trait::async_trait]
pub trait InteractiveSession: Send + Sync {
    /// Session identifier.
    fn id(&self) -> &str;
    /// Terminate the session, releasing its process.
    async fn close(&self) -> Result<(), ShellCloseError>;
}

/// Process-shared registry of interactive shell sessions, keyed by id.
#[derive(Default)]
pub struct ShellSessionStore {
    sessions: DashMap<String, Arc<dyn InteractiveSession>>,
}

impl ShellSessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, replacing any previous session with the same id.
    ///
    /// Returns the replaced session, if any, so the caller can close it.
    pub fn open(&self, session: Arc<dyn InteractiveSession>) -> Option<Arc<dyn InteractiveSession>> {
        self.sessions.insert(session.id().to_owned(), session)
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn InteractiveSession>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every registered session. Best-effort: failures are logged and
    /// the sweep continues. Returns the number of sessions removed.
    ///
    /// Safe under concurrent `open`/`close_all` from independent runs: each
    /// session is removed exactly once before its `close` is awaited.
    pub async fn close_all(&self) -> usize {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for id in ids {
            let Some((_, session)) = self.sessions.remove(&id) else {
                continue;
            };
            if let Err(e) = session.close().await {
                error!(session_id = %id, error = %e, "error closing interactive shell session");
            }
            closed += 1;
        }
        if closed > 0 {
            debug!(closed, "interactive shell sessions cleaned up");
        }
        closed
    }
}
