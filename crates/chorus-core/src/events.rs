//! Event types for team execution.
//!
//! Two event families:
//!
//! - **[`RawEvent`]**: Heterogeneous events produced by the agent executor
//!   while a run is in flight (agent switches, message deltas, tool calls,
//!   handoffs, voice frames).
//! - **[`TeamEvent`]**: The canonical tagged event streamed to callers.
//!
//! `RawEvent` is purely in-memory (never serialized — voice frames carry an
//! [`AudioPayload`] that may wrap an opaque buffer). `TeamEvent` is the wire
//! shape caller integrations (e.g. a websocket bridge) are built against, so
//! its tags and field names are stable.

use bytes::Bytes;
use chorus_audio::AudioPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// RawEvent — executor stream events
// ─────────────────────────────────────────────────────────────────────────────

/// Events yielded by the agent executor's streams.
///
/// Transient; normalized into [`TeamEvent`]s before leaving the runtime.
#[derive(Clone, Debug)]
pub enum RawEvent {
    /// The current agent changed.
    AgentUpdated {
        /// Name of the agent now in control.
        agent_name: String,
    },

    /// Incremental text content from the current agent.
    MessageDelta {
        /// Text fragment.
        delta: String,
    },

    /// The current agent invoked a tool.
    ToolCall {
        /// Tool name.
        tool_name: String,
        /// Tool arguments.
        arguments: Value,
    },

    /// A tool returned output to the current agent.
    ToolOutput {
        /// Tool name.
        tool_name: String,
        /// Tool output.
        output: Value,
    },

    /// Control transferred from one agent to another.
    Handoff {
        /// Agent ceding control.
        from_agent: String,
        /// Agent receiving control.
        to_agent: String,
    },

    /// One chunk of synthesized audio from the voice pipeline.
    VoiceAudio {
        /// The audio payload, in whatever shape the pipeline produced.
        payload: AudioPayload,
    },

    /// Text transcript fragment from the voice pipeline.
    VoiceText {
        /// Transcript text.
        text: String,
    },

    /// The executor finished; carries the final output.
    ///
    /// Always the last event of a successful stream. The runner converts it
    /// into the synthetic `completion` [`TeamEvent`] after exhaustion.
    Completed {
        /// Final output of the run.
        final_output: String,
    },

    /// The executor reported a non-fatal error event.
    Error {
        /// Error description.
        message: String,
    },
}

impl RawEvent {
    /// Event type label, for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AgentUpdated { .. } => "agent_updated",
            Self::MessageDelta { .. } => "message_delta",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolOutput { .. } => "tool_output",
            Self::Handoff { .. } => "handoff",
            Self::VoiceAudio { .. } => "voice_audio",
            Self::VoiceText { .. } => "voice_text",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TeamEvent — caller-facing normalized events
// ─────────────────────────────────────────────────────────────────────────────

/// Common fields carried by every [`TeamEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Name of the agent the event is attributed to.
    pub agent_name: String,
    /// Whether this event terminates the stream.
    pub is_done: bool,
}

impl EventMeta {
    /// Meta for a non-terminal event.
    #[must_use]
    pub fn partial(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            is_done: false,
        }
    }

    /// Meta for a terminal event.
    #[must_use]
    pub fn done(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            is_done: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// team_events! macro — generates TeamEvent, meta(), event_type()
// ─────────────────────────────────────────────────────────────────────────────

/// Declarative macro that generates [`TeamEvent`], its `meta()` and
/// `event_type()` accessors, and a compile-time `VARIANT_COUNT`.
///
/// Adding a new variant requires ONE edit (inside this invocation).
/// The compiler enforces exhaustive matching everywhere else.
macro_rules! team_events {
    ($(
        $(#[doc = $doc:literal])*
        $variant:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty
            ),*
            $(,)?
        } => $rename:literal
    ),* $(,)?) => {
        /// Canonical caller-facing event.
        ///
        /// Serialized with a `type` tag plus flattened [`EventMeta`], so each
        /// record carries `type`, `agent_name`, `is_done`, and either a
        /// `content` or a `data` payload. Caller integrations rely on exact
        /// tag strings and field names.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        #[allow(missing_docs)]
        pub enum TeamEvent {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $rename)]
                $variant {
                    #[serde(flatten)]
                    meta: EventMeta,
                    $(
                        $(#[$fmeta])*
                        $field: $ty,
                    )*
                },
            )*
        }

        impl TeamEvent {
            /// Get the common event fields.
            #[must_use]
            pub fn meta(&self) -> &EventMeta {
                match self {
                    $(Self::$variant { meta, .. } => meta,)*
                }
            }

            /// Get the event type string (for type discrimination).
            #[must_use]
            pub fn event_type(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => $rename,)*
                }
            }
        }

        /// Number of `TeamEvent` variants (compile-time constant for tests).
        #[cfg(test)]
        pub(crate) const VARIANT_COUNT: usize = [$($rename),*].len();
    };
}

team_events! {
    /// The current agent changed; subsequent events carry the new name.
    AgentUpdated {} => "agent_updated",

    /// Incremental text content.
    MessageDelta {
        content: String,
    } => "message_delta",

    /// Tool invocation by the current agent.
    ToolCall {
        content: Value,
    } => "tool_call",

    /// Tool output returned to the current agent.
    ToolOutput {
        content: Value,
    } => "tool_output",

    /// Control transferred between agents.
    Handoff {
        content: String,
    } => "handoff",

    /// One chunk of synthesized audio.
    VoiceAudio {
        data: Bytes,
    } => "voice_audio",

    /// Text response from the voice pipeline.
    TextResponse {
        content: String,
    } => "text_response",

    /// Terminal event of a successful run; carries the final output.
    Completion {
        content: String,
    } => "completion",

    /// Terminal event of a failed run.
    Error {
        content: String,
    } => "error",
}

impl TeamEvent {
    /// Whether this event type terminates a stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion { .. } | Self::Error { .. })
    }
}
