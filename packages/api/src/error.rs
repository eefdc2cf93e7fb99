//! Error types for the bridge service and client.

use std::net::SocketAddr;

/// Errors starting or configuring the bridge service.
///
/// None of these are fatal to the host: a failed start leaves the service
/// stopped and the host keeps running without the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn listener thread: {0}")]
    Thread(#[source] std::io::Error),

    #[error("invalid bridge config: {0}")]
    InvalidConfig(String),
}

/// Errors talking to a bridge from the desktop side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("bridge unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("bridge returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),
}
