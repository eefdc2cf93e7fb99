//! Shared FIFO between the listener thread and the host thread.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sushi_core::ImportJob;

/// Ordered queue of pending import jobs.
///
/// The listener is the only producer and the drain is the only consumer. Each
/// operation holds the lock for a single push or a single take-all, never
/// while a job is being imported.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: Mutex<VecDeque<ImportJob>>,
}

impl JobQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a job to the tail.
    pub fn push(&self, job: ImportJob) {
        self.lock().push_back(job);
    }

    /// Remove and return every queued job in FIFO order.
    ///
    /// Never waits for new jobs; returns an empty vector when nothing is queued.
    pub fn drain_all(&self) -> Vec<ImportJob> {
        let mut pending = self.lock();
        pending.drain(..).collect()
    }

    /// Number of jobs currently waiting.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated, so
    // the contents are still valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ImportJob>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use sushi_core::JobId;

    use super::*;

    fn job(paths: &[&str]) -> ImportJob {
        ImportJob::new(paths.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn drain_returns_jobs_in_push_order() {
        let queue = JobQueue::new();
        let j1 = job(&["/one.glb"]);
        let j2 = job(&["/two.glb", "/two-b.gltf"]);
        let j3 = job(&["/three.glb"]);

        queue.push(j1.clone());
        queue.push(j2.clone());
        queue.push(j3.clone());
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.drain_all(), vec![j1, j2, j3]);
        assert!(queue.drain_all().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_pushes_are_neither_lost_nor_duplicated() {
        let queue = Arc::new(JobQueue::new());
        let producers: Vec<_> = (0..8)
            .map(|n| {
                let queue = queue.clone();
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    for i in 0..50 {
                        let job = job(&[&format!("/p{n}/f{i}.glb")]);
                        ids.push(job.id());
                        queue.push(job);
                    }
                    ids
                })
            })
            .collect();

        let mut pushed: Vec<JobId> = Vec::new();
        let mut drained: Vec<JobId> = Vec::new();
        for producer in producers {
            pushed.extend(producer.join().expect("producer thread"));
            drained.extend(queue.drain_all().iter().map(ImportJob::id));
        }
        drained.extend(queue.drain_all().iter().map(ImportJob::id));

        pushed.sort();
        drained.sort();
        assert_eq!(pushed.len(), 400);
        assert_eq!(pushed, drained);
    }

    #[test]
    fn sequential_pushes_from_one_thread_keep_fifo() {
        let queue = Arc::new(JobQueue::new());
        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                (0..20)
                    .map(|i| {
                        let job = job(&[&format!("/f{i}.glb")]);
                        let id = job.id();
                        queue.push(job);
                        id
                    })
                    .collect::<Vec<_>>()
            })
        };
        let pushed = producer.join().expect("producer thread");
        let drained: Vec<_> = queue.drain_all().iter().map(ImportJob::id).collect();
        assert_eq!(pushed, drained);
    }
}
