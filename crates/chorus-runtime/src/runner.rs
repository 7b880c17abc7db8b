//! Team runner — owns the end-to-end run lifecycle.
//!
//! One run = resource acquisition → session resolution → executor
//! invocation → event normalization/forwarding → guaranteed finalization.
//! Streamed runs are driven by a spawned producer task writing into a
//! bounded channel; dropping the receiver stops forwarding but never skips
//! finalization.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use metrics::gauge;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, instrument};

use chorus_core::context::{CallerContext, enrich_session_context};
use chorus_core::events::{EventMeta, RawEvent, TeamEvent};

use crate::errors::{ExecutorError, RunError};
use crate::executor::{AgentExecutor, AudioInput, ExecConfig};
use crate::normalizer::EventNormalizer;
use crate::phase::{RunPhase, RunState};
use crate::resources::{ConnectionGuard, ToolConnections};
use crate::session::{SessionHandle, SessionProvider};
use crate::shell::ShellSessionStore;
use crate::team::{AgentSpec, Team};

/// Events buffered between the producer task and the caller.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What a run is addressed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunTarget {
    /// The orchestrator, with the full team's tool servers connected.
    Team,
    /// One named agent (orchestrator or worker), connected alone.
    Agent(String),
}

/// Per-run options.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Session id for conversation persistence; absent → memory-less run.
    pub session_id: Option<String>,
    /// Caller-supplied context map, folded into the session context.
    pub context: Option<CallerContext>,
    /// Turn budget override. Falls back to the team default, then to the
    /// executor's own default.
    pub max_turns: Option<u32>,
}

/// Result of a single-shot run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunOutput {
    /// Normalized output events (a single `completion`).
    pub outputs: Vec<TeamEvent>,
    /// Name of the agent that was addressed.
    pub agent_name: String,
    /// Always true for a returned output.
    pub is_done: bool,
}

/// Stream of normalized events.
///
/// Finite and single-pass: re-invoking the runner starts an entirely new
/// run with a fresh resource set. A failed run yields one `error` event
/// followed by one `Err` item after finalization.
pub type TeamEventStream = ReceiverStream<Result<TeamEvent, RunError>>;

/// Resolved target for one run.
#[derive(Debug)]
struct RunPlan {
    agent: Arc<AgentSpec>,
    connect_set: Vec<Arc<AgentSpec>>,
    workflow_name: String,
}

/// Input for a streamed run.
enum StreamInput {
    Text(String),
    Voice { bytes: Bytes, source_rate: u32 },
}

/// Drives a team (or one of its agents) through the run lifecycle.
///
/// Holds the team immutably plus the injected capabilities: the agent
/// executor, the tool-connection transport, the shared shell-session store,
/// and the session provider.
#[derive(Clone)]
pub struct TeamRunner {
    team: Arc<Team>,
    executor: Arc<dyn AgentExecutor>,
    connections: Arc<dyn ToolConnections>,
    shell_sessions: Arc<ShellSessionStore>,
    sessions: SessionProvider,
}

impl TeamRunner {
    /// Create a runner for `team` with the given capabilities.
    pub fn new(
        team: Arc<Team>,
        executor: Arc<dyn AgentExecutor>,
        connections: Arc<dyn ToolConnections>,
        shell_sessions: Arc<ShellSessionStore>,
        sessions: SessionProvider,
    ) -> Self {
        Self {
            team,
            executor,
            connections,
            shell_sessions,
            sessions,
        }
    }

    /// The team this runner drives.
    pub fn team(&self) -> &Arc<Team> {
        &self.team
    }

    /// Run to completion and return the final output.
    ///
    /// Resources are released on every exit path, including executor
    /// failure.
    #[instrument(skip_all, fields(run_id, target = ?target))]
    pub async fn run_once(
        &self,
        target: RunTarget,
        message: impl Into<String>,
        options: RunOptions,
    ) -> Result<RunOutput, RunError> {
        let message = message.into();
        let mut state = RunState::new();
        let _ = tracing::Span::current().record("run_id", state.run_id());

        let plan = self.plan(&target)?;
        info!(agent = %plan.agent.name, "contacting agent");
        gauge!("team_runs_active").increment(1.0);

        let mut guard = ConnectionGuard::new(Arc::clone(&self.connections));
        let mut session: Option<Arc<dyn SessionHandle>> = None;

        let result: Result<String, RunError> = async {
            guard.connect(&plan.connect_set).await?;
            state.advance(RunPhase::ResourcesAcquired);

            let context = enrich_session_context(
                options.context.as_ref(),
                &plan.agent.id,
                self.team.original_config(),
            );
            session = self
                .sessions
                .resolve(options.session_id.as_deref(), &context)
                .await?;
            state.advance(RunPhase::SessionResolved);

            state.advance(RunPhase::Executing);
            state.advance(RunPhase::SingleShot);
            let outcome = self
                .executor
                .execute(
                    Arc::clone(&plan.agent),
                    message,
                    session.clone(),
                    self.exec_config(&plan, &options),
                )
                .await?;
            Ok(outcome.final_output)
        }
        .await;

        if result.is_err() && state.phase().can_advance_to(RunPhase::Error) {
            state.advance(RunPhase::Error);
        }
        state.advance(RunPhase::Finalizing);
        self.finalize(guard, session.take()).await;
        state.advance(RunPhase::Done);
        gauge!("team_runs_active").decrement(1.0);

        let final_output = result?;
        Ok(RunOutput {
            outputs: vec![TeamEvent::Completion {
                meta: EventMeta::done(&plan.agent.name),
                content: final_output,
            }],
            agent_name: plan.agent.name.clone(),
            is_done: true,
        })
    }

    /// Run with streaming outputs.
    ///
    /// The returned stream is finite and not restartable. On a mid-stream
    /// executor failure it yields exactly one `error` event, then the error
    /// itself after finalization.
    pub fn run_streamed(
        &self,
        target: RunTarget,
        message: impl Into<String>,
        options: RunOptions,
    ) -> TeamEventStream {
        self.spawn_stream(target, StreamInput::Text(message.into()), options)
    }

    /// Run on voice input with streaming audio/text outputs.
    ///
    /// `audio` is decoded through the audio bridge (format fallback plus
    /// resampling from `source_sample_rate` to 24 kHz); a decode failure
    /// fails the whole call.
    pub fn run_voice_streamed(
        &self,
        target: RunTarget,
        audio: Bytes,
        source_sample_rate: u32,
        options: RunOptions,
    ) -> TeamEventStream {
        self.spawn_stream(
            target,
            StreamInput::Voice {
                bytes: audio,
                source_rate: source_sample_rate,
            },
            options,
        )
    }

    fn spawn_stream(
        &self,
        target: RunTarget,
        input: StreamInput,
        options: RunOptions,
    ) -> TeamEventStream {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let runner = self.clone();
        let _ = tokio::spawn(async move {
            runner.stream_task(target, input, options, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Producer task for a streamed run. Runs to finalization even when the
    /// receiver is dropped mid-stream.
    #[instrument(skip_all, fields(run_id))]
    async fn stream_task(
        self,
        target: RunTarget,
        input: StreamInput,
        options: RunOptions,
        tx: mpsc::Sender<Result<TeamEvent, RunError>>,
    ) {
        let mut state = RunState::new();
        let _ = tracing::Span::current().record("run_id", state.run_id());
        gauge!("team_runs_active").increment(1.0);

        let display_name = match &target {
            RunTarget::Team => self.team.orchestrator().name.clone(),
            RunTarget::Agent(name) => name.clone(),
        };
        let mut normalizer = EventNormalizer::new(display_name);
        let mut guard = ConnectionGuard::new(Arc::clone(&self.connections));
        let mut session: Option<Arc<dyn SessionHandle>> = None;
        let mut receiver_gone = false;

        let result: Result<(), RunError> = async {
            let plan = self.plan(&target)?;
            info!(agent = %plan.agent.name, "contacting agent");

            guard.connect(&plan.connect_set).await?;
            state.advance(RunPhase::ResourcesAcquired);

            let context = enrich_session_context(
                options.context.as_ref(),
                &plan.agent.id,
                self.team.original_config(),
            );
            session = self
                .sessions
                .resolve(options.session_id.as_deref(), &context)
                .await?;
            state.advance(RunPhase::SessionResolved);

            state.advance(RunPhase::Executing);
            let config = self.exec_config(&plan, &options);
            let mut events = match input {
                StreamInput::Text(message) => self.executor.execute_streamed(
                    Arc::clone(&plan.agent),
                    message,
                    session.clone(),
                    config,
                ),
                StreamInput::Voice { bytes, source_rate } => {
                    let samples = chorus_audio::to_canonical(&bytes, source_rate)?;
                    self.executor.execute_voice_streamed(
                        Arc::clone(&plan.agent),
                        AudioInput { buffer: samples },
                        session.clone(),
                        config,
                    )
                }
            };
            state.advance(RunPhase::Streaming);

            let mut final_output: Option<String> = None;
            while let Some(item) = events.next().await {
                match item {
                    Ok(RawEvent::Completed {
                        final_output: output,
                    }) => final_output = Some(output),
                    Ok(RawEvent::Error { message }) => {
                        return Err(RunError::Execution(ExecutorError::new(message)));
                    }
                    Ok(raw) => {
                        for event in normalizer.handle(raw) {
                            if !receiver_gone && tx.send(Ok(event)).await.is_err() {
                                receiver_gone = true;
                            }
                        }
                    }
                    Err(e) => return Err(RunError::Execution(e)),
                }
                if receiver_gone {
                    // Caller abandoned the stream. Stop forwarding and fall
                    // through to finalization; no synthetic completion is
                    // owed in this case.
                    info!("stream abandoned by caller");
                    break;
                }
            }

            if !receiver_gone {
                let completion = TeamEvent::Completion {
                    meta: EventMeta::done(normalizer.current_agent()),
                    content: final_output.unwrap_or_default(),
                };
                let _ = tx.send(Ok(completion)).await;
            }
            Ok(())
        }
        .await;

        // Signal, then raise: one error event now, the error itself after
        // finalization.
        if let Err(e) = &result {
            error!(kind = e.kind(), error = %e, "run failed");
            let event = TeamEvent::Error {
                meta: EventMeta::done(normalizer.current_agent()),
                content: e.to_string(),
            };
            let _ = tx.send(Ok(event)).await;
        }

        if result.is_err() && state.phase().can_advance_to(RunPhase::Error) {
            state.advance(RunPhase::Error);
        }
        state.advance(RunPhase::Finalizing);
        self.finalize(guard, session.take()).await;
        state.advance(RunPhase::Done);
        gauge!("team_runs_active").decrement(1.0);

        if let Err(e) = result {
            let _ = tx.send(Err(e)).await;
        }
    }

    /// Release per-run resources in fixed order: interactive shell sessions,
    /// then the persistence session, then tool-server connections.
    ///
    /// Shell sessions may be referenced by in-flight tool calls that must
    /// fully unwind before the session (which may log final state) closes;
    /// network connections go last. Teardown never fails the run.
    async fn finalize(&self, guard: ConnectionGuard, session: Option<Arc<dyn SessionHandle>>) {
        let _ = self.shell_sessions.close_all().await;
        if let Some(session) = session {
            if let Err(e) = session.cleanup().await {
                error!(session_id = session.session_id(), error = %e, "error cleaning up session");
            }
        }
        guard.release().await;
    }

    /// Resolve the target into an agent, a connect set, and a workflow name.
    fn plan(&self, target: &RunTarget) -> Result<RunPlan, RunError> {
        match target {
            RunTarget::Team => Ok(RunPlan {
                agent: Arc::clone(self.team.orchestrator()),
                connect_set: self.team.all_agents(),
                workflow_name: self.team.workflow_name().to_owned(),
            }),
            RunTarget::Agent(name) => {
                let agent = self
                    .team
                    .get_agent(name)
                    .ok_or_else(|| RunError::AgentNotFound(name.clone()))?;
                Ok(RunPlan {
                    connect_set: vec![Arc::clone(&agent)],
                    workflow_name: agent.name.clone(),
                    agent,
                })
            }
        }
    }

    /// Turn budget: explicit option, else the team default, else the
    /// executor's own default.
    fn exec_config(&self, plan: &RunPlan, options: &RunOptions) -> ExecConfig {
        ExecConfig {
            workflow_name: Some(plan.workflow_name.clone()),
            max_turns: options.max_turns.or(self.team.max_turns()),
        }
    }
}
