//! Core domain types for the Sushi bridge.
//!
//! This crate contains shared types used across all packages:
//! - ImportJob and JobId for queued work
//! - ImportOutcome for per-file results of a drain
//! - Wire protocol payloads spoken over the loopback HTTP channel

mod events;
mod job;
mod protocol;

pub use events::ImportOutcome;
pub use job::{ImportJob, JobId};
pub use protocol::{
    ACTION_IMPORT, APP_NAME, BRIDGE_PATH, BridgeStatus, DEFAULT_PORT, ErrorResponse,
    HealthResponse, ImportRequest, QueuedResponse,
};
