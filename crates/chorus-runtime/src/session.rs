//! Session resolution for conversation persistence.
//!
//! A run without a session id proceeds memory-less. Otherwise a caller-
//! registered custom provider is tried first; its failures are logged and
//! fall through to the default store, never aborting the run. Default-store
//! failures do abort the run (resource acquisition).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use chorus_core::context::SessionContext;

use crate::errors::RunError;

/// Error from the session store or a session handle.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SessionStoreError(pub String);

/// Durable conversation-memory handle scoped to one run.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Session identifier.
    fn session_id(&self) -> &str;

    /// Release the handle's resources.
    ///
    /// The runner calls this exactly once per run, after the executor has
    /// fully finished. Failures are logged by the runner, never surfaced.
    async fn cleanup(&self) -> Result<(), SessionStoreError>;
}

impl std::fmt::Debug for dyn SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id())
            .finish()
    }
}

/// External capability that creates context-aware sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session keyed by `session_id` and the enriched context.
    async fn create(
        &self,
        session_id: &str,
        context: &SessionContext,
    ) -> Result<Arc<dyn SessionHandle>, SessionStoreError>;
}

/// Caller-registered factory tried before the default store.
///
/// Returning `Ok(None)` declines the session and falls through.
pub type CustomSessionFactory =
    Arc<dyn Fn(&str) -> Result<Option<Arc<dyn SessionHandle>>, SessionStoreError> + Send + Sync>;

/// Resolves a session handle for each run.
#[derive(Clone)]
pub struct SessionProvider {
    store: Arc<dyn SessionStore>,
    custom: Option<CustomSessionFactory>,
}

impl SessionProvider {
    /// Create a provider over the default store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            custom: None,
        }
    }

    /// Register a custom session factory, tried before the default store.
    #[must_use]
    pub fn with_custom_factory(mut self, factory: CustomSessionFactory) -> Self {
        self.custom = Some(factory);
        self
    }

    /// Resolve a session for the run.
    ///
    /// An absent or empty `session_id` resolves to `None` and the run
    /// proceeds without persistent memory.
    pub async fn resolve(
        &self,
        session_id: Option<&str>,
        context: &SessionContext,
    ) -> Result<Option<Arc<dyn SessionHandle>>, RunError> {
        let Some(id) = session_id.filter(|s| !s.is_empty()) else {
            info!("no session_id provided - running without persistent memory");
            return Ok(None);
        };

        if let Some(factory) = &self.custom {
            match factory(id) {
                Ok(Some(handle)) => {
                    info!(session_id = id, "using custom session provider");
                    return Ok(Some(handle));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        session_id = id,
                        error = %e,
                        "custom session provider failed, falling back to default"
                    );
                }
            }
        }

        let handle = self
            .store
            .create(id, context)
            .await
            .map_err(|e| RunError::SessionCreation(e.to_string()))?;
        info!(session_id = id, team_id = %context.team_id, "session resolved");
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::context::enrich_session_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeHandle {
        id: String,
    }

    #[async_trait]
    impl SessionHandle for FakeHandle {
        fn session_id(&self) -> &str {
            &self.id
        }

        async fn cleanup(&self) -> Result<(), SessionStoreError> {
            Ok(())
        }
    }

    struct FakeStore {
        creates: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SessionStore for FakeStore {
        async fn create(
            &self,
            session_id: &str,
            _context: &SessionContext,
        ) -> Result<Arc<dyn SessionHandle>, SessionStoreError> {
            let _ = self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionStoreError("store unavailable".into()));
            }
            Ok(Arc::new(FakeHandle {
                id: session_id.into(),
            }))
        }
    }

    fn store(fail: bool) -> Arc<FakeStore> {
        Arc::new(FakeStore {
            creates: AtomicUsize::new(0),
            fail,
        })
    }

    fn context() -> SessionContext {
        enrich_session_context(None, "agent_1", None)
    }

    fn label(handle: &Arc<dyn SessionHandle>) -> &'static str {
        // All test handles are FakeHandle; identify via session_id prefix.
        if handle.session_id().starts_with("custom:") {
            "custom"
        } else {
            "default"
        }
    }

    #[tokio::test]
    async fn no_session_id_resolves_none() {
        let provider = SessionProvider::new(store(false));
        let resolved = provider.resolve(None, &context()).await.unwrap();
        assert!(resolved.is_none());

        let resolved = provider.resolve(Some(""), &context()).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn default_store_creates_session() {
        let fake = store(false);
        let provider = SessionProvider::new(fake.clone());
        let resolved = provider.resolve(Some("sess_1"), &context()).await.unwrap();
        assert_eq!(resolved.unwrap().session_id(), "sess_1");
        assert_eq!(fake.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_factory_wins() {
        let fake = store(false);
        let provider = SessionProvider::new(fake.clone()).with_custom_factory(Arc::new(|id| {
            Ok(Some(Arc::new(FakeHandle {
                id: format!("custom:{id}"),
            }) as Arc<dyn SessionHandle>))
        }));
        let resolved = provider
            .resolve(Some("sess_1"), &context())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(label(&resolved), "custom");
        // Default store never consulted.
        assert_eq!(fake.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_factory_error_falls_through() {
        let fake = store(false);
        let provider = SessionProvider::new(fake.clone())
            .with_custom_factory(Arc::new(|_| Err(SessionStoreError("broken factory".into()))));
        let resolved = provider
            .resolve(Some("sess_1"), &context())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(label(&resolved), "default");
        assert_eq!(fake.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_factory_decline_falls_through() {
        let fake = store(false);
        let provider = SessionProvider::new(fake.clone()).with_custom_factory(Arc::new(|_| Ok(None)));
        let resolved = provider.resolve(Some("sess_1"), &context()).await.unwrap();
        assert!(resolved.is_some());
        assert_eq!(fake.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_store_failure_aborts() {
        let provider = SessionProvider::new(store(true));
        let err = provider
            .resolve(Some("sess_1"), &context())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "resource_acquisition");
    }
}
