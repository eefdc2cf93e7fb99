//! Import job types for work handed from the listener to the host thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an import job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One accepted import request: the file paths exactly as the client sent them.
///
/// Paths are not checked for existence here; that happens when the job is
/// drained on the host thread. A job is never modified after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    id: JobId,
    files: Vec<String>,
    received_at: DateTime<Utc>,
}

impl ImportJob {
    /// Create a job for the given paths, stamped with a fresh ID and the current time.
    pub fn new(files: Vec<String>) -> Self {
        Self {
            id: JobId::new(),
            files,
            received_at: Utc::now(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Paths in submission order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume the job, yielding its paths.
    pub fn into_files(self) -> Vec<String> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_keeps_paths_in_order() {
        let job = ImportJob::new(vec!["/a.glb".into(), "b.gltf".into()]);
        assert_eq!(job.files(), ["/a.glb", "b.gltf"]);
        assert_eq!(job.len(), 2);
        assert!(!job.is_empty());
        assert_eq!(job.clone().into_files(), vec!["/a.glb", "b.gltf"]);
    }

    #[test]
    fn job_ids_are_unique_and_parse_back() {
        let first = ImportJob::new(vec!["x.glb".into()]);
        let second = ImportJob::new(vec!["x.glb".into()]);
        assert_ne!(first.id(), second.id());

        let parsed = JobId::parse(&first.id().to_string()).expect("valid ulid");
        assert_eq!(parsed, first.id());
    }
}
