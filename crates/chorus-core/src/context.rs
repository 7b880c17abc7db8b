//! Session context enrichment.
//!
//! Every run derives a [`SessionContext`] from the team's original
//! configuration document and the caller-supplied context map. Enrichment is
//! a pure function: no I/O, no logging, deterministic output. Downstream
//! persistence and tool access key off the result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel team id used when the configuration carries none.
pub const UNKNOWN_TEAM_ID: &str = "unknown";

/// Caller-supplied context: a free-form JSON object.
pub type CallerContext = Map<String, Value>;

/// Enriched identity/metadata record attached to a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Team id from the original configuration, or [`UNKNOWN_TEAM_ID`].
    pub team_id: String,
    /// Id of the agent the run is addressed to.
    pub agent_id: String,
    /// Account id; caller value wins over the configuration value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    /// Session id, when the caller passed one in the context map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// The original team configuration document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_config: Option<Value>,
    /// Free-form metadata. Caller-context keys not consumed by the named
    /// fields above are folded in here — nothing is silently lost.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Derive a [`SessionContext`] from the caller context, the target agent id,
/// and the team's original configuration document.
///
/// - `team_id` — configuration `id`, else [`UNKNOWN_TEAM_ID`]
/// - `account_id` — caller value if present (never overwritten), else the
///   configuration `account_id`, else `None`
/// - `session_id` — caller value if present
/// - `metadata` — caller `metadata` object if present, else empty; remaining
///   unconsumed caller keys are inserted without clobbering explicit entries
#[must_use]
pub fn enrich_session_context(
    caller: Option<&CallerContext>,
    agent_id: &str,
    original_config: Option<&Value>,
) -> SessionContext {
    let team_id = original_config
        .and_then(|c| c.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TEAM_ID)
        .to_owned();

    let account_id = caller
        .and_then(|c| c.get("account_id"))
        .and_then(Value::as_i64)
        .or_else(|| {
            original_config
                .and_then(|c| c.get("account_id"))
                .and_then(Value::as_i64)
        });

    let session_id = caller
        .and_then(|c| c.get("session_id"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    let mut metadata = caller
        .and_then(|c| c.get("metadata"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(caller) = caller {
        for (key, value) in caller {
            if matches!(key.as_str(), "account_id" | "session_id" | "metadata") {
                continue;
            }
            let _ = metadata.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    SessionContext {
        team_id,
        agent_id: agent_id.to_owned(),
        account_id,
        session_id,
        original_config: original_config.cloned(),
        metadata,
    }
}
