//! Service lifecycle: one listener thread per running bridge.

use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::Router;
use dispatch::{JobQueue, LOG_TARGET};
use tokio::sync::oneshot;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::server::BridgeServer;

/// Handle to a running listener. Present only while the bridge is up.
struct ServiceHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    exited: mpsc::Receiver<()>,
    thread: JoinHandle<()>,
}

impl ServiceHandle {
    /// Bind the loopback listener and start serving on a dedicated thread.
    fn spawn(config: &BridgeConfig, queue: Arc<JobQueue>) -> Result<Self, BridgeError> {
        let addr = config.bind_addr();
        let listener =
            TcpListener::bind(addr).map_err(|source| BridgeError::Bind { addr, source })?;
        listener.set_nonblocking(true).map_err(BridgeError::Io)?;
        let local_addr = listener.local_addr().map_err(BridgeError::Io)?;

        let worker_threads = config.worker_threads.max(1);
        let app = BridgeServer::new(queue, config).router();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (exited_tx, exited_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        // The runtime is built and dropped on the listener thread only.
        let thread = thread::Builder::new()
            .name("sushi-bridge".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(worker_threads)
                    .thread_name("sushi-bridge-worker")
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                if let Err(e) = runtime.block_on(serve(listener, app, shutdown_rx)) {
                    tracing::warn!(target: LOG_TARGET, "bridge listener failed: {}", e);
                }
                runtime.shutdown_timeout(Duration::from_millis(100));
                let _ = exited_tx.send(());
            })
            .map_err(BridgeError::Thread)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(BridgeError::Runtime(e));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(BridgeError::Thread(std::io::Error::other(
                    "listener thread exited during startup",
                )));
            }
        }

        Ok(Self {
            local_addr,
            shutdown: shutdown_tx,
            exited: exited_rx,
            thread,
        })
    }

    /// Stop accepting, then wait up to `timeout` for the thread to finish.
    fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown.send(());
        match self.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.thread.join().is_err() {
                    tracing::warn!(target: LOG_TARGET, "bridge listener thread panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    "bridge listener did not exit within {:?}; leaving it to finish",
                    timeout
                );
            }
        }
    }
}

async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: oneshot::Receiver<()>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::from_std(listener)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await
}

/// The bridge service: a job queue plus an optional running listener.
///
/// `start` and `stop` are idempotent and may be called in any order. The
/// queue outlives the listener, so jobs queued before a `stop` are still
/// there after the next `start`.
pub struct BridgeService {
    config: BridgeConfig,
    queue: Arc<JobQueue>,
    running: Mutex<Option<ServiceHandle>>,
}

impl BridgeService {
    /// Create a stopped service with its own empty queue.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_queue(config, Arc::new(JobQueue::new()))
    }

    /// Create a stopped service feeding an existing queue.
    pub fn with_queue(config: BridgeConfig, queue: Arc<JobQueue>) -> Self {
        Self {
            config,
            queue,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The queue the listener pushes into; hand this to the host-thread drain.
    pub fn queue(&self) -> Arc<JobQueue> {
        self.queue.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    /// Address actually bound, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().as_ref().map(|h| h.local_addr)
    }

    /// Start listening. A no-op returning the current address if already running.
    ///
    /// On failure the error is logged, the service stays stopped, and the
    /// error is returned for callers that want it.
    pub fn start(&self) -> Result<SocketAddr, BridgeError> {
        let mut running = self.lock();
        if let Some(handle) = running.as_ref() {
            return Ok(handle.local_addr);
        }

        match ServiceHandle::spawn(&self.config, self.queue.clone()) {
            Ok(handle) => {
                let addr = handle.local_addr;
                *running = Some(handle);
                tracing::info!(target: LOG_TARGET, "bridge listening on {}", addr);
                Ok(addr)
            }
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, "could not start bridge: {}", e);
                Err(e)
            }
        }
    }

    /// Stop listening. A no-op if not running.
    ///
    /// Returns once the listener has stopped accepting or `shutdown_timeout`
    /// has elapsed. Queued jobs are kept.
    pub fn stop(&self) {
        let mut running = self.lock();
        if let Some(handle) = running.take() {
            handle.shutdown(self.config.shutdown_timeout);
            tracing::info!(target: LOG_TARGET, "bridge stopped");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ServiceHandle>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for BridgeService {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BridgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeService")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn start_and_stop_from_current_thread_runtime() {
        let service = BridgeService::new(
            BridgeConfig::ephemeral().with_shutdown_timeout(Duration::from_secs(2)),
        );

        for _ in 0..3 {
            let addr = service.start().expect("start");
            assert_ne!(addr.port(), 0);
            assert!(service.is_running());

            let began = Instant::now();
            service.stop();
            assert!(!service.is_running());
            assert!(began.elapsed() < Duration::from_secs(2));
        }
    }

    #[test]
    fn start_failure_leaves_no_handle() {
        let occupied = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = occupied.local_addr().expect("addr").port();
        let service = BridgeService::new(BridgeConfig::default().with_port(port));

        assert!(matches!(service.start(), Err(BridgeError::Bind { .. })));
        assert_eq!(service.local_addr(), None);
    }
}
