//! # chorus-core
//!
//! Foundation vocabulary for the Chorus team execution runtime.
//!
//! - **Events**: [`events::RawEvent`] from the agent executor,
//!   [`events::TeamEvent`] for callers (the stable stream-item shape)
//! - **Session context**: [`context::SessionContext`] and the pure
//!   enrichment function [`context::enrich_session_context`]
//! - **Logging**: [`logging::init`] tracing-subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depends on: chorus-audio (outbound payload type).
//! Depended on by: chorus-runtime.

#![deny(unsafe_code)]

pub mod context;
pub mod events;
pub mod logging;

pub use context::{CallerContext, SessionContext, enrich_session_context};
pub use events::{EventMeta, RawEvent, TeamEvent};
