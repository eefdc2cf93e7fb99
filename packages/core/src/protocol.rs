//! Wire payloads for the loopback bridge protocol.

use serde::{Deserialize, Serialize};

use crate::ImportJob;

/// Fixed loopback port the bridge listens on.
pub const DEFAULT_PORT: u16 = 29877;

/// The only routed path.
pub const BRIDGE_PATH: &str = "/sushi";

/// Application name reported by the health check.
pub const APP_NAME: &str = "sushi-bridge";

/// The only action the bridge understands.
pub const ACTION_IMPORT: &str = "import";

/// Body of `POST /sushi`.
///
/// Both fields are optional on the wire; a missing `files` is the same as an
/// empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

impl ImportRequest {
    /// Build an import request for the given paths.
    pub fn import(files: Vec<String>) -> Self {
        Self {
            action: Some(ACTION_IMPORT.to_string()),
            files: Some(files),
        }
    }

    /// Turn the request into a job if it is an import with at least one file.
    pub fn into_job(self) -> Option<ImportJob> {
        let files = self.files.unwrap_or_default();
        if self.action.as_deref() == Some(ACTION_IMPORT) && !files.is_empty() {
            Some(ImportJob::new(files))
        } else {
            None
        }
    }
}

/// Body of a successful `GET /sushi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            app: APP_NAME.to_string(),
        }
    }
}

/// Body of a successful `POST /sushi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub status: String,
    pub queued: usize,
}

impl QueuedResponse {
    pub fn new(queued: usize) -> Self {
        Self {
            status: "ok".to_string(),
            queued,
        }
    }
}

/// Body of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn invalid_json() -> Self {
        Self {
            error: "invalid json".to_string(),
        }
    }

    pub fn unknown_action() -> Self {
        Self {
            error: "unknown action or no files".to_string(),
        }
    }
}

/// Connection status as seen from the desktop side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeStatus {
    pub fn connected() -> Self {
        Self {
            connected: true,
            error: None,
        }
    }

    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            connected: true,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.connected && self.error.is_none()
    }
}
