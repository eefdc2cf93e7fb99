//! Host-thread dispatch for the Sushi bridge.
//!
//! This crate owns the handoff between the network listener and the single
//! thread the host allows to mutate its state.
//!
//! # Architecture
//!
//! - `JobQueue` - Shared FIFO; the listener pushes, the host thread drains
//! - `ImporterRegistry` - Maps file extensions to the host's import capability
//! - `MainThreadDrain` - Periodic callback that empties the queue and imports files
//! - `Scheduler` / `TimerLoop` - The host's cooperative timer contract
//!
//! # Usage
//!
//! ```ignore
//! use dispatch::{ImporterRegistry, JobQueue, MainThreadDrain, TimerLoop};
//!
//! let queue = Arc::new(JobQueue::new());
//! let drain = MainThreadDrain::new(queue.clone(), importers);
//! let control = drain.attach(&timers);
//! ```

mod drain;
mod handler;
mod queue;
mod scheduler;

pub use drain::{DrainConfig, DrainControl, DrainReport, DrainSignal, MainThreadDrain};
pub use handler::{FnImporter, ImportError, ImportResult, Importer, ImporterRegistry};
pub use queue::JobQueue;
pub use scheduler::{PeriodicCallback, Reschedule, Scheduler, TimerLoop};

/// Log target shared by every bridge diagnostic line.
pub const LOG_TARGET: &str = "sushi";
