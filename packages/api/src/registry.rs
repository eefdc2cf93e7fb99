//! Process-wide bridge instance for host enable/disable hooks.

use std::net::SocketAddr;
use std::sync::LazyLock;

use dispatch::LOG_TARGET;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::service::BridgeService;

/// Global service instance, configured from the environment on first use.
static SERVICE: LazyLock<BridgeService> = LazyLock::new(|| {
    let config = BridgeConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(target: LOG_TARGET, "{}; using defaults", e);
        BridgeConfig::default()
    });
    BridgeService::new(config)
});

/// Get the process-wide bridge service.
///
/// Hosts with a single enable/disable lifecycle use this; anything that needs
/// independent instances (tests, embedding) constructs a [`BridgeService`].
pub fn global_service() -> &'static BridgeService {
    &SERVICE
}

/// Host enable hook: start the global bridge.
pub fn register() -> Result<SocketAddr, BridgeError> {
    global_service().start()
}

/// Host disable hook: stop the global bridge, keeping any queued jobs.
pub fn unregister() {
    global_service().stop();
}
