//! Host-thread drain: empties the job queue and runs the importers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sushi_core::{ImportJob, ImportOutcome};

use crate::LOG_TARGET;
use crate::handler::{ImportError, ImporterRegistry};
use crate::queue::JobQueue;
use crate::scheduler::{Reschedule, Scheduler};

/// Polling cadence requested from the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainConfig {
    /// Delay before the next poll after a cycle that imported something.
    pub active_interval: Duration,
    /// Delay before the next poll after a cycle that found the queue empty.
    pub idle_interval: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_millis(100),
            idle_interval: Duration::from_millis(250),
        }
    }
}

impl DrainConfig {
    /// Set the interval used after a busy cycle.
    pub fn with_active_interval(mut self, interval: Duration) -> Self {
        self.active_interval = interval;
        self
    }

    /// Set the interval used after an idle cycle.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }
}

/// Everything one drain cycle did, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of jobs taken off the queue.
    pub jobs: usize,
    /// One outcome per path, across all drained jobs.
    pub outcomes: Vec<ImportOutcome>,
}

impl DrainReport {
    /// True when the queue was empty.
    pub fn is_idle(&self) -> bool {
        self.jobs == 0
    }

    pub fn imported(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.imported()
    }
}

/// Result of a single tick, reported back to the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainSignal {
    /// Nothing was queued; no need to poll again urgently.
    Idle,
    /// Jobs were drained and their files processed.
    Processed { jobs: usize, files: usize },
}

impl DrainSignal {
    /// Translate the signal into the scheduler's reschedule request.
    pub fn reschedule(&self, config: &DrainConfig) -> Reschedule {
        match self {
            DrainSignal::Idle => Reschedule::After(config.idle_interval),
            DrainSignal::Processed { .. } => Reschedule::After(config.active_interval),
        }
    }
}

impl From<&DrainReport> for DrainSignal {
    fn from(report: &DrainReport) -> Self {
        if report.is_idle() {
            DrainSignal::Idle
        } else {
            DrainSignal::Processed {
                jobs: report.jobs,
                files: report.outcomes.len(),
            }
        }
    }
}

/// Handle to a drain registered with a scheduler.
#[derive(Debug, Clone, Default)]
pub struct DrainControl {
    detached: Arc<AtomicBool>,
}

impl DrainControl {
    /// Ask the registered drain to unregister on its next firing.
    ///
    /// Jobs still queued at that point stay in the queue.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}

/// Consumer side of the [`JobQueue`], run on the host's main thread.
pub struct MainThreadDrain {
    queue: Arc<JobQueue>,
    importers: ImporterRegistry,
    config: DrainConfig,
}

impl MainThreadDrain {
    /// Create a drain over `queue` using the given importers.
    pub fn new(queue: Arc<JobQueue>, importers: ImporterRegistry) -> Self {
        Self {
            queue,
            importers,
            config: DrainConfig::default(),
        }
    }

    /// Set the polling cadence.
    pub fn with_config(mut self, config: DrainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    /// Take every queued job and import its files one by one.
    ///
    /// The queue lock is released before the first import starts. A failure
    /// on one path never stops the remaining paths or jobs.
    pub fn run_once(&self) -> DrainReport {
        let jobs = self.queue.drain_all();
        let mut report = DrainReport {
            jobs: jobs.len(),
            outcomes: Vec::new(),
        };

        for job in jobs {
            self.run_job(&job, &mut report.outcomes);
        }

        if !report.is_idle() {
            tracing::debug!(
                target: LOG_TARGET,
                jobs = report.jobs,
                imported = report.imported(),
                failed = report.failed(),
                "Drain cycle finished"
            );
        }
        report
    }

    /// One scheduler tick.
    pub fn tick(&self) -> DrainSignal {
        DrainSignal::from(&self.run_once())
    }

    /// Register this drain as a periodic callback on the host scheduler.
    pub fn attach<S: Scheduler + ?Sized>(self, scheduler: &S) -> DrainControl {
        let control = DrainControl::default();
        let detached = control.clone();
        scheduler.register_periodic(Box::new(move || {
            if detached.is_detached() {
                return Reschedule::Stop;
            }
            self.tick().reschedule(&self.config)
        }));
        control
    }

    fn run_job(&self, job: &ImportJob, outcomes: &mut Vec<ImportOutcome>) {
        for raw in job.files() {
            let outcome = self.import_path(raw);
            if outcome.is_success() {
                tracing::info!(target: LOG_TARGET, job_id = %job.id(), "{}", outcome.description());
            } else {
                tracing::warn!(target: LOG_TARGET, job_id = %job.id(), "{}", outcome.description());
            }
            outcomes.push(outcome);
        }
    }

    /// Resolve, check and import a single path.
    pub fn import_path(&self, raw: &str) -> ImportOutcome {
        let Ok(path) = resolve(raw) else {
            return ImportOutcome::NotFound {
                path: raw.to_string(),
            };
        };
        let display = path.display().to_string();

        if !path.is_file() {
            return ImportOutcome::NotFound { path: display };
        }

        let extension = extension_of(&path);
        let Some(importer) = self.importers.get(&extension) else {
            return ImportOutcome::Unsupported {
                path: display,
                extension,
            };
        };

        match panic::catch_unwind(AssertUnwindSafe(|| importer.import(&path))) {
            Ok(Ok(())) => ImportOutcome::Imported { path: display },
            Ok(Err(e)) => ImportOutcome::Failed {
                path: display,
                error: e.to_string(),
            },
            Err(payload) => ImportOutcome::Failed {
                path: display,
                error: ImportError::Panicked(panic_message(payload.as_ref())).to_string(),
            },
        }
    }
}

/// Absolute form of `raw` with `.` and `..` folded away lexically.
///
/// Symlinks are not followed, so `missing/../model.glb` finds `model.glb`.
fn resolve(raw: &str) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(raw)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
