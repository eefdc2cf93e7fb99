//! Bridge configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use sushi_core::DEFAULT_PORT;

use crate::error::BridgeError;

/// Listener configuration.
///
/// The bridge always binds the loopback interface; only the port is
/// configurable. Port 0 asks the OS for an ephemeral port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// TCP port on 127.0.0.1.
    pub port: u16,
    /// Upper bound for reading a request body.
    pub read_timeout: Duration,
    /// Upper bound `stop` waits for the listener thread to exit.
    pub shutdown_timeout: Duration,
    /// Tokio worker threads serving connections.
    pub worker_threads: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_timeout: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(3),
            worker_threads: 2,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl BridgeConfig {
    /// Config on an OS-assigned port, for tests and side-by-side instances.
    pub fn ephemeral() -> Self {
        Self::default().with_port(0)
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the body read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the shutdown wait bound.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the number of worker threads (at least one is always used).
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Set the maximum body size.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Address the listener binds.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }

    /// Build a config from environment variables.
    ///
    /// - `SUSHI_BRIDGE_PORT` (default: 29877)
    /// - `SUSHI_BRIDGE_READ_TIMEOUT_MS` (default: 1000)
    /// - `SUSHI_BRIDGE_SHUTDOWN_TIMEOUT_MS` (default: 3000)
    pub fn from_env() -> Result<Self, BridgeError> {
        let mut cfg = Self::default();
        if let Some(port) = parse_env::<u16>("SUSHI_BRIDGE_PORT")? {
            cfg.port = port;
        }
        if let Some(ms) = parse_env::<u64>("SUSHI_BRIDGE_READ_TIMEOUT_MS")? {
            cfg.read_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env::<u64>("SUSHI_BRIDGE_SHUTDOWN_TIMEOUT_MS")? {
            cfg.shutdown_timeout = Duration::from_millis(ms);
        }
        Ok(cfg)
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str) -> Result<Option<T>, BridgeError> {
    let v = match std::env::var(var_name) {
        Ok(v) => v,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => {
            return Err(BridgeError::InvalidConfig(format!(
                "failed reading {var_name}: {e}"
            )));
        }
    };
    parse_value(var_name, &v)
}

fn parse_value<T: std::str::FromStr>(var_name: &str, v: &str) -> Result<Option<T>, BridgeError> {
    let trimmed = v.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| BridgeError::InvalidConfig(format!("invalid value for {var_name}={v}")))
}
