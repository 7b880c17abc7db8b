//! Tool-server connection lifecycle.
//!
//! Connections are scoped to one run's agent set and are not shared across
//! runs. The guard records exactly what it connected so release can tear
//! down that set and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, warn};

use crate::errors::RunError;
use crate::team::AgentSpec;

/// Error from the tool-connection transport.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ConnectionError(pub String);

/// External capability that opens and closes tool-server connections.
///
/// Implementations connect whatever they are given; idempotency across a
/// run is the [`ConnectionGuard`]'s job.
#[async_trait]
pub trait ToolConnections: Send + Sync {
    /// Establish connections for the given agents.
    async fn connect(&self, agents: &[Arc<AgentSpec>]) -> Result<(), ConnectionError>;
    /// Tear down connections for the given agents.
    async fn disconnect(&self, agents: &[Arc<AgentSpec>]) -> Result<(), ConnectionError>;
}

/// Scoped acquisition of tool-server connections for one run.
///
/// `connect` is idempotent per agent: an agent this guard already connected
/// is skipped, as is any agent bearing no tool servers. `release` is
/// best-effort and never fails the run.
pub struct ConnectionGuard {
    transport: Arc<dyn ToolConnections>,
    connected: Vec<Arc<AgentSpec>>,
}

impl ConnectionGuard {
    /// Create an empty guard over the given transport.
    pub fn new(transport: Arc<dyn ToolConnections>) -> Self {
        Self {
            transport,
            connected: Vec::new(),
        }
    }

    /// Connect tool servers for `agents`.
    ///
    /// Failure aborts the run; connections recorded by earlier calls remain
    /// tracked so finalization can release the partial set.
    pub async fn connect(&mut self, agents: &[Arc<AgentSpec>]) -> Result<(), RunError> {
        let pending: Vec<Arc<AgentSpec>> = agents
            .iter()
            .filter(|agent| {
                !agent.tool_servers.is_empty()
                    && !self.connected.iter().any(|c| c.name == agent.name)
            })
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        self.transport
            .connect(&pending)
            .await
            .map_err(|e| RunError::ResourceAcquisition(e.to_string()))?;
        debug!(agents = pending.len(), "tool servers connected");
        self.connected.extend(pending);
        Ok(())
    }

    /// Number of agents this guard has connected.
    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    /// Release every connection this guard opened.
    ///
    /// Per-agent: a failing disconnect is logged and the rest proceed.
    pub async fn release(mut self) {
        for agent in self.connected.drain(..) {
            if let Err(e) = self
                .transport
                .disconnect(std::slice::from_ref(&agent))
                .await
            {
                counter!("team_tool_disconnect_failures_total").increment(1);
                warn!(agent = %agent.name, error = %e, "tool disconnect failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        connects: Mutex<Vec<Vec<String>>>,
        disconnects: Mutex<Vec<Vec<String>>>,
        fail_connect: bool,
        fail_disconnect_for: Option<String>,
    }

    #[async_trait]
    impl ToolConnections for Recording {
        async fn connect(&self, agents: &[Arc<AgentSpec>]) -> Result<(), ConnectionError> {
            if self.fail_connect {
                return Err(ConnectionError("transport refused".into()));
            }
            self.connects
                .lock()
                .push(agents.iter().map(|a| a.name.clone()).collect());
            Ok(())
        }

        async fn disconnect(&self, agents: &[Arc<AgentSpec>]) -> Result<(), ConnectionError> {
            self.disconnects
                .lock()
                .push(agents.iter().map(|a| a.name.clone()).collect());
            if let Some(bad) = &self.fail_disconnect_for {
                if agents.iter().any(|a| &a.name == bad) {
                    return Err(ConnectionError("teardown failed".into()));
                }
            }
            Ok(())
        }
    }

    fn tool_agent(name: &str) -> Arc<AgentSpec> {
        Arc::new(AgentSpec {
            id: format!("{name}_id"),
            name: name.into(),
            instructions: String::new(),
            tool_servers: vec!["search".into()],
            is_orchestrator: false,
        })
    }

    fn bare_agent(name: &str) -> Arc<AgentSpec> {
        Arc::new(AgentSpec {
            id: format!("{name}_id"),
            name: name.into(),
            instructions: String::new(),
            tool_servers: vec![],
            is_orchestrator: false,
        })
    }

    #[tokio::test]
    async fn connects_only_tool_bearing_agents() {
        let transport = Arc::new(Recording::default());
        let mut guard = ConnectionGuard::new(transport.clone());
        guard
            .connect(&[tool_agent("a"), bare_agent("plain")])
            .await
            .unwrap();
        assert_eq!(guard.connected_count(), 1);
        assert_eq!(transport.connects.lock().as_slice(), [vec!["a".to_string()]]);
    }

    #[tokio::test]
    async fn reconnect_is_noop_per_agent() {
        let transport = Arc::new(Recording::default());
        let mut guard = ConnectionGuard::new(transport.clone());
        guard.connect(&[tool_agent("a")]).await.unwrap();
        guard.connect(&[tool_agent("a"), tool_agent("b")]).await.unwrap();
        assert_eq!(guard.connected_count(), 2);
        // Second call only connected the new agent.
        assert_eq!(
            transport.connects.lock().as_slice(),
            [vec!["a".to_string()], vec!["b".to_string()]]
        );
    }

    #[tokio::test]
    async fn release_disconnects_each_connected_agent() {
        let transport = Arc::new(Recording::default());
        let mut guard = ConnectionGuard::new(transport.clone());
        guard.connect(&[tool_agent("a"), tool_agent("b")]).await.unwrap();
        guard.release().await;
        assert_eq!(
            transport.disconnects.lock().as_slice(),
            [vec!["a".to_string()], vec!["b".to_string()]]
        );
    }

    #[tokio::test]
    async fn release_continues_past_failures() {
        let transport = Arc::new(Recording {
            fail_disconnect_for: Some("a".into()),
            ..Recording::default()
        });
        let mut guard = ConnectionGuard::new(transport.clone());
        guard.connect(&[tool_agent("a"), tool_agent("b")]).await.unwrap();
        guard.release().await;
        // Both teardowns were attempted despite the first failing.
        assert_eq!(transport.disconnects.lock().len(), 2);
    }

    #[tokio::test]
    async fn connect_failure_is_resource_acquisition() {
        let transport = Arc::new(Recording {
            fail_connect: true,
            ..Recording::default()
        });
        let mut guard = ConnectionGuard::new(transport);
        let err = guard.connect(&[tool_agent("a")]).await.unwrap_err();
        assert_eq!(err.kind(), "resource_acquisition");
        assert_eq!(guard.connected_count(), 0);
    }

    #[tokio::test]
    async fn release_of_empty_guard_is_noop() {
        let transport = Arc::new(Recording::default());
        let guard = ConnectionGuard::new(transport.clone());
        guard.release().await;
        assert!(transport.disconnects.lock().is_empty());
    }
}
