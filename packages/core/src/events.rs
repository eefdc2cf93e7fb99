//! Per-file outcomes produced while draining import jobs.

use serde::{Deserialize, Serialize};

/// What happened to a single path during a drain cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The importer accepted the file.
    Imported { path: String },
    /// The resolved path does not reference an existing file.
    NotFound { path: String },
    /// The file exists but no importer handles its extension.
    Unsupported { path: String, extension: String },
    /// The importer reported an error (or panicked).
    Failed { path: String, error: String },
}

impl ImportOutcome {
    /// The resolved path this outcome refers to.
    pub fn path(&self) -> &str {
        match self {
            ImportOutcome::Imported { path } => path,
            ImportOutcome::NotFound { path } => path,
            ImportOutcome::Unsupported { path, .. } => path,
            ImportOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }

    /// Get a short description of this outcome for logging.
    pub fn description(&self) -> String {
        match self {
            ImportOutcome::Imported { path } => format!("imported: {}", path),
            ImportOutcome::NotFound { path } => format!("file not found: {}", path),
            ImportOutcome::Unsupported { extension, .. } if extension.is_empty() => {
                "unsupported format: (no extension)".to_string()
            }
            ImportOutcome::Unsupported { extension, .. } => {
                format!("unsupported format: .{}", extension)
            }
            ImportOutcome::Failed { path, error } => {
                format!("import error for {}: {}", path, error)
            }
        }
    }
}
