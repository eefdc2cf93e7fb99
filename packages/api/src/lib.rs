//! Loopback HTTP bridge for the Sushi asset manager.
//!
//! This crate contains the network side of the bridge:
//! - `BridgeServer` - axum router validating `/sushi` requests into queued jobs
//! - `BridgeService` - start/stop lifecycle of the listener thread
//! - `register` / `unregister` - hooks driving the process-wide instance
//! - `BridgeClient` - the desktop application's side of the protocol

mod client;
mod config;
mod error;
mod registry;
mod server;
mod service;

pub use client::BridgeClient;
pub use config::BridgeConfig;
pub use error::{BridgeError, ClientError};
pub use registry::{global_service, register, unregister};
pub use server::BridgeServer;
pub use service::BridgeService;

// Re-export core types for convenience
pub use sushi_core::{BridgeStatus, DEFAULT_PORT, HealthResponse, ImportJob, QueuedResponse};
