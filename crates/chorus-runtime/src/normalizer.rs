//! Raw event normalization.
//!
//! Converts the executor's heterogeneous [`RawEvent`] stream into the
//! canonical [`TeamEvent`] shape, tracking which agent is currently in
//! control. Each raw event maps to zero or more normalized events (a
//! handoff is composite: the handoff itself plus an agent update); relative
//! order is preserved and nothing is buffered.
//!
//! `Completed` and `Error` raw events are control signals consumed by the
//! runner (the synthetic `completion`, and "signal, then raise", are the
//! runner's job), so they normalize to nothing here.

use metrics::counter;
use serde_json::json;
use tracing::warn;

use chorus_core::events::{EventMeta, RawEvent, TeamEvent};

/// Stateful raw → canonical event mapper for one stream.
pub struct EventNormalizer {
    current_agent: String,
}

impl EventNormalizer {
    /// Create a normalizer; `initial_agent` attributes events until the
    /// executor reports a change.
    pub fn new(initial_agent: impl Into<String>) -> Self {
        Self {
            current_agent: initial_agent.into(),
        }
    }

    /// Name of the agent currently in control.
    pub fn current_agent(&self) -> &str {
        &self.current_agent
    }

    /// Normalize one raw event into zero or more team events.
    pub fn handle(&mut self, raw: RawEvent) -> Vec<TeamEvent> {
        match raw {
            RawEvent::AgentUpdated { agent_name } => {
                if agent_name == self.current_agent {
                    return Vec::new();
                }
                self.current_agent = agent_name;
                vec![TeamEvent::AgentUpdated {
                    meta: EventMeta::partial(&self.current_agent),
                }]
            }

            RawEvent::MessageDelta { delta } => vec![TeamEvent::MessageDelta {
                meta: EventMeta::partial(&self.current_agent),
                content: delta,
            }],

            RawEvent::ToolCall {
                tool_name,
                arguments,
            } => vec![TeamEvent::ToolCall {
                meta: EventMeta::partial(&self.current_agent),
                content: json!({"tool": tool_name, "arguments": arguments}),
            }],

            RawEvent::ToolOutput { tool_name, output } => vec![TeamEvent::ToolOutput {
                meta: EventMeta::partial(&self.current_agent),
                content: json!({"tool": tool_name, "output": output}),
            }],

            RawEvent::Handoff {
                from_agent,
                to_agent,
            } => {
                let handoff = TeamEvent::Handoff {
                    meta: EventMeta::partial(&from_agent),
                    content: format!("{from_agent} -> {to_agent}"),
                };
                self.current_agent = to_agent;
                vec![
                    handoff,
                    TeamEvent::AgentUpdated {
                        meta: EventMeta::partial(&self.current_agent),
                    },
                ]
            }

            RawEvent::VoiceAudio { payload } => {
                let kind = payload.kind();
                match payload.into_bytes() {
                    Ok(data) => vec![TeamEvent::VoiceAudio {
                        meta: EventMeta::partial(&self.current_agent),
                        data,
                    }],
                    Err(e) => {
                        // Audio streaming is lossy-tolerant: skip the chunk,
                        // keep the stream.
                        counter!("team_audio_chunks_dropped_total").increment(1);
                        warn!(payload = kind, error = %e, "dropping unconvertible audio chunk");
                        Vec::new()
                    }
                }
            }

            RawEvent::VoiceText { text } => vec![TeamEvent::TextResponse {
                meta: EventMeta::partial(&self.current_agent),
                content: text,
            }],

            RawEvent::Completed { .. } | RawEvent::Error { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chorus_audio::{AudioPayload, ByteConvertible, ChunkError};
    use serde_json::Value;
    use std::sync::Arc;

    struct Unconvertible;

    impl ByteConvertible for Unconvertible {
        fn to_bytes(&self) -> Result<Bytes, ChunkError> {
            Err(ChunkError::Convert("no byte form".into()))
        }
    }

    #[test]
    fn passes_message_delta_with_current_agent() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::MessageDelta { delta: "hi".into() });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].meta().agent_name, "Orchestrator");
        assert!(!events[0].meta().is_done);
    }

    #[test]
    fn agent_update_changes_attribution() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::AgentUpdated {
            agent_name: "Researcher".into(),
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "agent_updated");
        assert_eq!(normalizer.current_agent(), "Researcher");

        let events = normalizer.handle(RawEvent::MessageDelta { delta: "x".into() });
        assert_eq!(events[0].meta().agent_name, "Researcher");
    }

    #[test]
    fn agent_update_to_same_agent_is_silent() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::AgentUpdated {
            agent_name: "Orchestrator".into(),
        });
        assert!(events.is_empty());
    }

    #[test]
    fn handoff_is_composite_and_retargets() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::Handoff {
            from_agent: "Orchestrator".into(),
            to_agent: "Researcher".into(),
        });
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "handoff");
        assert_eq!(events[0].meta().agent_name, "Orchestrator");
        assert_eq!(events[1].event_type(), "agent_updated");
        assert_eq!(events[1].meta().agent_name, "Researcher");
        assert_eq!(normalizer.current_agent(), "Researcher");
    }

    #[test]
    fn tool_events_have_structured_content() {
        let mut normalizer = EventNormalizer::new("worker");
        let events = normalizer.handle(RawEvent::ToolCall {
            tool_name: "search".into(),
            arguments: serde_json::json!({"q": "rust"}),
        });
        let TeamEvent::ToolCall { content, .. } = &events[0] else {
            panic!("expected tool_call");
        };
        assert_eq!(content["tool"], "search");
        assert_eq!(content["arguments"]["q"], "rust");

        let events = normalizer.handle(RawEvent::ToolOutput {
            tool_name: "search".into(),
            output: Value::String("3 results".into()),
        });
        let TeamEvent::ToolOutput { content, .. } = &events[0] else {
            panic!("expected tool_output");
        };
        assert_eq!(content["output"], "3 results");
    }

    #[test]
    fn voice_audio_normalizes_to_bytes() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::VoiceAudio {
            payload: AudioPayload::Samples(vec![1, -1]),
        });
        assert_eq!(events.len(), 1);
        let TeamEvent::VoiceAudio { data, .. } = &events[0] else {
            panic!("expected voice_audio");
        };
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn unconvertible_audio_chunk_is_dropped() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        let events = normalizer.handle(RawEvent::VoiceAudio {
            payload: AudioPayload::Convertible(Arc::new(Unconvertible)),
        });
        assert!(events.is_empty());

        // The stream continues: later events still normalize.
        let events = normalizer.handle(RawEvent::VoiceText { text: "hi".into() });
        assert_eq!(events[0].event_type(), "text_response");
    }

    #[test]
    fn control_events_normalize_to_nothing() {
        let mut normalizer = EventNormalizer::new("Orchestrator");
        assert!(
            normalizer
                .handle(RawEvent::Completed {
                    final_output: "done".into()
                })
                .is_empty()
        );
        assert!(
            normalizer
                .handle(RawEvent::Error {
                    message: "boom".into()
                })
                .is_empty()
        );
    }

    #[test]
    fn order_is_preserved_across_a_burst() {
        let mut normalizer = EventNormalizer::new("A");
        let raws = vec![
            RawEvent::MessageDelta { delta: "1".into() },
            RawEvent::Handoff {
                from_agent: "A".into(),
                to_agent: "B".into(),
            },
            RawEvent::MessageDelta { delta: "2".into() },
        ];
        let types: Vec<String> = raws
            .into_iter()
            .flat_map(|raw| normalizer.handle(raw))
            .map(|e| e.event_type().to_owned())
            .collect();
        assert_eq!(
            types,
            ["message_delta", "handoff", "agent_updated", "message_delta"]
        );
    }
}
