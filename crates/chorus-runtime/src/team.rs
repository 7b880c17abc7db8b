//! Team composition: one orchestrator plus named workers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Display name used when the team configuration carries none.
const UNNAMED_TEAM: &str = "Unknown Team";

/// Validated specification of a single agent.
///
/// Opaque to this crate: the executor interprets it, the runtime only
/// routes it. Agents bearing no tool servers need no connection during
/// resource acquisition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Configuration id (stable across renames).
    pub id: String,
    /// Display name; unique within a team.
    pub name: String,
    /// System instructions.
    #[serde(default)]
    pub instructions: String,
    /// Tool servers this agent is wired to.
    #[serde(default)]
    pub tool_servers: Vec<String>,
    /// Whether this agent is the team's orchestrator.
    #[serde(default)]
    pub is_orchestrator: bool,
}

/// Errors building a [`Team`].
#[derive(Debug, thiserror::Error)]
pub enum TeamBuildError {
    /// The configuration contained no agents at all.
    #[error("team configuration contains no agents")]
    NoAgents,
}

/// Immutable composition of one orchestrator and zero or more workers.
///
/// Created once at build time, read-only during execution. Runners hold it
/// behind an `Arc` and never mutate it.
#[derive(Debug)]
pub struct Team {
    orchestrator: Arc<AgentSpec>,
    workers: BTreeMap<String, Arc<AgentSpec>>,
    name: Option<String>,
    max_turns: Option<u32>,
    /// Agent id → display name.
    agent_ids: HashMap<String, String>,
    original_config: Option<Value>,
}

impl Team {
    /// Build a team from an ordered agent list.
    ///
    /// The first agent marked `is_orchestrator` becomes the orchestrator;
    /// the rest become workers keyed by name. When none is marked, the
    /// first agent is promoted and a warning is logged.
    pub fn from_agents(
        agents: Vec<AgentSpec>,
        name: Option<String>,
        max_turns: Option<u32>,
        original_config: Option<Value>,
    ) -> Result<Self, TeamBuildError> {
        let mut orchestrator: Option<AgentSpec> = None;
        let mut rest: Vec<AgentSpec> = Vec::new();
        for agent in agents {
            if agent.is_orchestrator && orchestrator.is_none() {
                orchestrator = Some(agent);
            } else {
                rest.push(agent);
            }
        }
        let orchestrator = match orchestrator {
            Some(agent) => agent,
            None => {
                if rest.is_empty() {
                    return Err(TeamBuildError::NoAgents);
                }
                let promoted = rest.remove(0);
                warn!(
                    agent = %promoted.name,
                    "no orchestrator found, using first agent as orchestrator"
                );
                promoted
            }
        };

        let agent_ids = std::iter::once(&orchestrator)
            .chain(rest.iter())
            .map(|a| (a.id.clone(), a.name.clone()))
            .collect();
        let workers = rest
            .into_iter()
            .map(|a| (a.name.clone(), Arc::new(a)))
            .collect();

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            workers,
            name,
            max_turns,
            agent_ids,
            original_config,
        })
    }

    /// The orchestrator agent.
    pub fn orchestrator(&self) -> &Arc<AgentSpec> {
        &self.orchestrator
    }

    /// Worker agents keyed by name.
    pub fn workers(&self) -> &BTreeMap<String, Arc<AgentSpec>> {
        &self.workers
    }

    /// Optional display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Configured default turn budget.
    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    /// The original configuration document this team was built from.
    pub fn original_config(&self) -> Option<&Value> {
        self.original_config.as_ref()
    }

    /// Workflow name for executor run configuration.
    pub fn workflow_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_TEAM)
    }

    /// Resolve an agent by display name (orchestrator or worker).
    pub fn get_agent(&self, name: &str) -> Option<Arc<AgentSpec>> {
        if self.orchestrator.name == name {
            return Some(Arc::clone(&self.orchestrator));
        }
        self.workers.get(name).cloned()
    }

    /// Resolve an agent's display name from its configuration id.
    pub fn agent_name_for_id(&self, id: &str) -> Option<&str> {
        self.agent_ids.get(id).map(String::as_str)
    }

    /// All agents, orchestrator first.
    pub fn all_agents(&self) -> Vec<Arc<AgentSpec>> {
        std::iter::once(Arc::clone(&self.orchestrator))
            .chain(self.workers.values().cloned())
            .collect()
    }
}
