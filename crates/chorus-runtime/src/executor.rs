//! The agent executor seam.
//!
//! The language-model call/completion engine is an external collaborator.
//! This module defines the capability contract the runner drives: single-shot
//! execution, streamed text execution, and streamed voice execution. All
//! three take the agent spec, the run configuration, and an optional session
//! handle for conversation memory.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use chorus_core::events::RawEvent;

use crate::errors::ExecutorError;
use crate::session::SessionHandle;
use crate::team::AgentSpec;

/// Stream of raw events from a streamed execution.
///
/// A successful stream ends with [`RawEvent::Completed`] carrying the final
/// output; an `Err` item aborts the stream.
pub type RawEventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, ExecutorError>> + Send>>;

/// Per-run executor configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecConfig {
    /// Workflow name for the executor's own tracing.
    pub workflow_name: Option<String>,
    /// Turn budget; `None` leaves the executor's default in effect.
    pub max_turns: Option<u32>,
}

/// Result of a single-shot execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Final output of the agent.
    pub final_output: String,
}

/// Canonical audio input for voice execution: i16 samples at 24 kHz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioInput {
    /// Sample buffer.
    pub buffer: Vec<i16>,
}

/// External capability that executes agents.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Run the agent to completion and return its final output.
    async fn execute(
        &self,
        agent: Arc<AgentSpec>,
        input: String,
        session: Option<Arc<dyn SessionHandle>>,
        config: ExecConfig,
    ) -> Result<ExecutionOutcome, ExecutorError>;

    /// Run the agent, streaming raw events as they are produced.
    fn execute_streamed(
        &self,
        agent: Arc<AgentSpec>,
        input: String,
        session: Option<Arc<dyn SessionHandle>>,
        config: ExecConfig,
    ) -> RawEventStream;

    /// Run the agent on voice input, streaming audio and text events.
    fn execute_voice_streamed(
        &self,
        agent: Arc<AgentSpec>,
        audio: AudioInput,
        session: Option<Arc<dyn SessionHandle>>,
        config: ExecConfig,
    ) -> RawEventStream;
}
