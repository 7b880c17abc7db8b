//! # chorus-runtime
//!
//! Team execution loop, resource lifecycle, and event streaming.
//!
//! - **Team**: Immutable orchestrator + workers composition from validated
//!   configuration, with the first-agent promotion fallback
//! - **Runner**: `run_once` / `run_streamed` / `run_voice_streamed`, with
//!   guaranteed finalization on every exit path
//! - **Normalizer**: raw executor events → canonical [`chorus_core::events::TeamEvent`]
//! - **Guards**: tool-server connections (per run), interactive shell
//!   sessions (process-shared), persistence session (at most one per run)
//! - **Seams**: [`executor::AgentExecutor`], [`resources::ToolConnections`],
//!   [`session::SessionStore`] — the external capabilities this crate drives
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: chorus-core, chorus-audio.

#![deny(unsafe_code)]

pub mod errors;
pub mod executor;
pub mod normalizer;
pub mod phase;
pub mod resources;
pub mod runner;
pub mod session;
pub mod shell;
pub mod team;

// Re-export main public API
pub use errors::{ExecutorError, RunError};
pub use executor::{AgentExecutor, AudioInput, ExecConfig, ExecutionOutcome, RawEventStream};
pub use normalizer::EventNormalizer;
pub use phase::{RunPhase, RunState};
pub use resources::{ConnectionError, ConnectionGuard, ToolConnections};
pub use runner::{RunOptions, RunOutput, RunTarget, TeamEventStream, TeamRunner};
pub use session::{
    CustomSessionFactory, SessionHandle, SessionProvider, SessionStore, SessionStoreError,
};
pub use shell::{InteractiveSession, ShellCloseError, ShellSessionStore};
pub use team::{AgentSpec, Team, TeamBuildError};
